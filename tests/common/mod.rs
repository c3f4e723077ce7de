#![allow(dead_code)]

use async_trait::async_trait;
use picmirror::{
    ConfigStore, FileRecord, HandlerResult, HostContext, HostHandles, MemoryConfigStore,
    MemoryUploaderRegistry, Result, Transport, TransportRequest, TransportResponse,
    UploadContext, Uploader,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport that answers every request with 200 and an empty body.
pub struct OkTransport;

#[async_trait]
impl Transport for OkTransport {
    async fn request(&self, _req: TransportRequest) -> Result<TransportResponse> {
        Ok(TransportResponse {
            status: http::StatusCode::OK,
            headers: vec![],
            body: vec![],
        })
    }
}

/// What an uploader saw when it was called.
#[derive(Debug, Clone)]
pub struct Seen {
    pub file_name: String,
    pub payload: Option<Vec<u8>>,
    pub had_url: bool,
}

/// Sets `img_url = https://<id>/<file_name>` on every item, optionally after
/// a delay, and records its input.
pub struct StampUploader {
    id: String,
    delay: Option<Duration>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Seen>>,
}

impl StampUploader {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(StampUploader {
            id: id.to_string(),
            delay: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn with_delay(id: &str, delay: Duration) -> Arc<Self> {
        Arc::new(StampUploader {
            id: id.to_string(),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Uploader for StampUploader {
    fn name(&self) -> &str {
        &self.id
    }

    async fn handle(&self, ctx: &mut UploadContext) -> HandlerResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut seen = self.seen.lock().unwrap();
            for item in &ctx.output {
                seen.push(Seen {
                    file_name: item.file_name.clone(),
                    payload: item.payload_bytes().map(|b| b.into_owned()),
                    had_url: item.img_url.is_some() || item.url.is_some(),
                });
            }
        }

        // Write a marker into the buffer before yielding, so a shared buffer
        // would be visible to a sibling destination.
        for item in ctx.output.iter_mut() {
            if let Some(ref mut buf) = item.buffer {
                buf.extend_from_slice(self.id.as_bytes());
            }
            item.file_name = format!("{}:{}", self.id, item.file_name);
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        for item in ctx.output.iter_mut() {
            let original = item
                .file_name
                .strip_prefix(&format!("{}:", self.id))
                .ok_or("file name was changed by someone else")?
                .to_string();
            item.img_url = Some(format!("https://{}/{}", self.id, original));
            item.file_name = original;
        }
        Ok(())
    }
}

/// Always fails with the given message.
pub struct FailingUploader {
    message: String,
    calls: AtomicUsize,
}

impl FailingUploader {
    pub fn new(message: &str) -> Arc<Self> {
        Arc::new(FailingUploader {
            message: message.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Uploader for FailingUploader {
    fn name(&self) -> &str {
        "failing"
    }

    async fn handle(&self, _ctx: &mut UploadContext) -> HandlerResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Err(self.message.clone().into())
    }
}

/// Returns successfully without producing any URL.
pub struct SilentUploader;

#[async_trait]
impl Uploader for SilentUploader {
    fn name(&self) -> &str {
        "silent"
    }

    async fn handle(&self, _ctx: &mut UploadContext) -> HandlerResult {
        Ok(())
    }
}

/// A host with `primary` as its current uploader and `destinations` selected
/// for backup.
pub struct TestHost {
    pub store: Arc<MemoryConfigStore>,
    pub registry: Arc<MemoryUploaderRegistry>,
    pub handles: HostHandles,
}

impl TestHost {
    pub fn new(primary: &str, destinations: &[&str]) -> Self {
        let store = Arc::new(MemoryConfigStore::new());
        store
            .set("picBed.uploader", serde_json::json!(primary))
            .unwrap();
        store
            .set(
                "picgo-plugin-multiple-backup",
                serde_json::json!({
                    "backupDestinationIds": destinations,
                    "verboseLogging": true
                }),
            )
            .unwrap();
        let registry = Arc::new(MemoryUploaderRegistry::new());
        let handles = HostHandles::new(store.clone(), registry.clone())
            .with_transport(Arc::new(OkTransport));

        TestHost {
            store,
            registry,
            handles,
        }
    }

    pub fn register(&self, id: &str, uploader: Arc<dyn Uploader>) {
        self.registry.register(id, uploader);
    }

    pub fn context(&self, output: Vec<FileRecord>) -> HostContext {
        HostContext::new(self.handles.clone(), output)
    }
}

pub fn image(name: &str, bytes: &[u8]) -> FileRecord {
    FileRecord::new(name).with_buffer(bytes.to_vec())
}

/// The record as the primary uploader leaves it: renamed, URL set, and the
/// buffer already released.
pub fn uploaded(name: &str, url: &str) -> FileRecord {
    FileRecord::new(name).with_img_url(url)
}

pub fn failed(name: &str) -> FileRecord {
    FileRecord::new(name)
}
