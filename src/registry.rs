//! In-memory uploader registry and hook chain.
//!
//! Real hosts bring their own; these back embedded use and the test suites.

use crate::host::{HookRegistry, HostContext, UploadHook, Uploader, UploaderRegistry};
use crate::types::DestinationId;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct MemoryUploaderRegistry {
    uploaders: DashMap<DestinationId, Arc<dyn Uploader>>,
}

impl MemoryUploaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: impl Into<DestinationId>, uploader: Arc<dyn Uploader>) {
        self.uploaders.insert(id.into(), uploader);
    }

    pub fn unregister(&self, id: &str) -> bool {
        self.uploaders.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.uploaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uploaders.is_empty()
    }
}

impl UploaderRegistry for MemoryUploaderRegistry {
    /// Ids in lexical order.
    fn list_ids(&self) -> Vec<DestinationId> {
        let mut ids: Vec<DestinationId> = self.uploaders.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    fn get(&self, id: &str) -> Option<Arc<dyn Uploader>> {
        self.uploaders.get(id).map(|entry| Arc::clone(entry.value()))
    }
}

/// Ordered before/after-upload hook lists.
#[derive(Default)]
pub struct HookChain {
    before_upload: Vec<(String, Arc<dyn UploadHook>)>,
    after_upload: Vec<(String, Arc<dyn UploadHook>)>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before_upload_names(&self) -> Vec<&str> {
        self.before_upload.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn after_upload_names(&self) -> Vec<&str> {
        self.after_upload.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Run every before-upload hook in registration order. Hook errors are
    /// logged and do not stop the chain.
    pub async fn run_before_upload(&self, ctx: &HostContext) {
        run_chain("beforeUpload", &self.before_upload, ctx).await;
    }

    pub async fn run_after_upload(&self, ctx: &HostContext) {
        run_chain("afterUpload", &self.after_upload, ctx).await;
    }
}

async fn run_chain(stage: &str, hooks: &[(String, Arc<dyn UploadHook>)], ctx: &HostContext) {
    for (name, hook) in hooks {
        if let Err(e) = hook.handle(ctx).await {
            tracing::error!("[HOOK {}] {} failed: {}", stage, name, e);
        }
    }
}

impl HookRegistry for HookChain {
    fn register_before_upload(&mut self, name: &str, hook: Arc<dyn UploadHook>) {
        self.before_upload.retain(|(n, _)| n != name);
        self.before_upload.push((name.to_string(), hook));
    }

    fn register_after_upload(&mut self, name: &str, hook: Arc<dyn UploadHook>) {
        self.after_upload.retain(|(n, _)| n != name);
        self.after_upload.push((name.to_string(), hook));
    }
}
