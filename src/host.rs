//! Interfaces the host upload pipeline provides to plugins.
//!
//! The host owns the uploader registry, the configuration store, the HTTP
//! transport and the lifecycle hooks. This crate only describes their shape;
//! `picmirror-backup` consumes them.

use crate::error::{MirrorError, Result};
use crate::types::{DestinationId, FileRecord};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Error type returned by host-supplied handlers (uploaders and hooks).
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
pub type HandlerResult = std::result::Result<(), HandlerError>;

/// A destination's upload implementation.
///
/// `handle` reads payloads from `ctx.output` and writes the resolved URLs
/// back into the same records.
#[async_trait]
pub trait Uploader: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, ctx: &mut UploadContext) -> HandlerResult;
}

/// Registry of uploaders keyed by destination id.
pub trait UploaderRegistry: Send + Sync {
    fn list_ids(&self) -> Vec<DestinationId>;

    fn get(&self, id: &str) -> Option<Arc<dyn Uploader>>;
}

/// Key/value configuration with dotted key paths (`picBed.uploader`).
pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> Option<serde_json::Value>;

    fn set(&self, key: &str, value: serde_json::Value) -> Result<()>;
}

/// Deserialize the value at `key`, `Ok(None)` if absent.
pub fn config_section<T: DeserializeOwned>(
    store: &dyn ConfigStore,
    key: &str,
) -> Result<Option<T>> {
    match store.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| MirrorError::Config(format!("{}: {}", key, e))),
    }
}

#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: http::Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl TransportRequest {
    pub fn new(method: http::Method, url: impl Into<String>) -> Self {
        TransportRequest {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: http::StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Network request capability handed to uploaders.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, req: TransportRequest) -> Result<TransportResponse>;
}

/// Transports the host exposes. Older hosts only provide the legacy one.
#[derive(Clone, Default)]
pub struct HostTransports {
    pub current: Option<Arc<dyn Transport>>,
    pub legacy: Option<Arc<dyn Transport>>,
}

/// Read-only capability handles shared by every context derived from the host.
#[derive(Clone)]
pub struct HostHandles {
    pub config: Arc<dyn ConfigStore>,
    pub uploaders: Arc<dyn UploaderRegistry>,
    pub transports: HostTransports,
    pub base_dir: Option<PathBuf>,
}

impl HostHandles {
    pub fn new(config: Arc<dyn ConfigStore>, uploaders: Arc<dyn UploaderRegistry>) -> Self {
        HostHandles {
            config,
            uploaders,
            transports: HostTransports::default(),
            base_dir: None,
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transports.current = Some(transport);
        self
    }

    pub fn with_legacy_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transports.legacy = Some(transport);
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }
}

/// The host's shared context as seen by lifecycle hooks.
#[derive(Clone)]
pub struct HostContext {
    pub handles: HostHandles,
    pub output: Vec<FileRecord>,
}

impl HostContext {
    pub fn new(handles: HostHandles, output: Vec<FileRecord>) -> Self {
        HostContext { handles, output }
    }
}

/// Execution context an [`Uploader`] runs against.
///
/// Owns its output buffer outright; the capability handles are shared and
/// read-only.
pub struct UploadContext {
    config: Arc<dyn ConfigStore>,
    transport: Arc<dyn Transport>,
    base_dir: Option<PathBuf>,
    pub output: Vec<FileRecord>,
}

impl UploadContext {
    pub fn new(
        config: Arc<dyn ConfigStore>,
        transport: Arc<dyn Transport>,
        base_dir: Option<PathBuf>,
        output: Vec<FileRecord>,
    ) -> Self {
        UploadContext {
            config,
            transport,
            base_dir,
            output,
        }
    }

    pub async fn request(&self, req: TransportRequest) -> Result<TransportResponse> {
        self.transport.request(req).await
    }

    pub fn get_config(&self, key: &str) -> Option<serde_json::Value> {
        self.config.get(key)
    }

    pub fn config_section<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        config_section(self.config.as_ref(), key)
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

/// Handler attached to a lifecycle stage of the host pipeline.
#[async_trait]
pub trait UploadHook: Send + Sync {
    async fn handle(&self, ctx: &HostContext) -> HandlerResult;
}

/// Where plugins register their lifecycle hooks.
pub trait HookRegistry {
    /// Runs before the primary upload, with the in-flight file records.
    fn register_before_upload(&mut self, name: &str, hook: Arc<dyn UploadHook>);

    /// Runs after the primary upload, with the final file records.
    fn register_after_upload(&mut self, name: &str, hook: Arc<dyn UploadHook>);
}
