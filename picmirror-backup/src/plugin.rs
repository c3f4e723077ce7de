use crate::form::{config_form, FormField};
use crate::manager::BackupOrchestrator;
use async_trait::async_trait;
use picmirror::{HandlerResult, HookRegistry, HostContext, HostHandles, UploadHook};
use std::sync::Arc;

pub const CACHE_HOOK_NAME: &str = "multiple-backup-cache";
pub const BACKUP_HOOK_NAME: &str = "multiple-backup";

/// Wires a [`BackupOrchestrator`] into the host's upload lifecycle.
pub struct BackupPlugin {
    orchestrator: Arc<BackupOrchestrator>,
    detached: bool,
}

impl BackupPlugin {
    pub fn new(orchestrator: Arc<BackupOrchestrator>) -> Self {
        Self {
            orchestrator,
            detached: false,
        }
    }

    /// When detached, the after-upload hook returns as soon as the cycle is
    /// spawned instead of waiting for every destination.
    pub fn detached(mut self, detached: bool) -> Self {
        self.detached = detached;
        self
    }

    pub fn orchestrator(&self) -> &Arc<BackupOrchestrator> {
        &self.orchestrator
    }

    pub fn register(&self, hooks: &mut dyn HookRegistry) {
        hooks.register_before_upload(
            CACHE_HOOK_NAME,
            Arc::new(CaptureHook {
                orchestrator: Arc::clone(&self.orchestrator),
            }),
        );
        hooks.register_after_upload(
            BACKUP_HOOK_NAME,
            Arc::new(BackupHook {
                orchestrator: Arc::clone(&self.orchestrator),
                detached: self.detached,
            }),
        );
    }

    pub fn config_form(&self, handles: &HostHandles) -> Vec<FormField> {
        config_form(handles)
    }
}

struct CaptureHook {
    orchestrator: Arc<BackupOrchestrator>,
}

#[async_trait]
impl UploadHook for CaptureHook {
    async fn handle(&self, ctx: &HostContext) -> HandlerResult {
        self.orchestrator.capture(ctx);
        Ok(())
    }
}

struct BackupHook {
    orchestrator: Arc<BackupOrchestrator>,
    detached: bool,
}

#[async_trait]
impl UploadHook for BackupHook {
    /// Never reports an error: backup results must not change the primary
    /// upload's outcome.
    async fn handle(&self, ctx: &HostContext) -> HandlerResult {
        let cycle = self.orchestrator.spawn_cycle(ctx);
        if self.detached {
            return Ok(());
        }
        if let Err(e) = cycle.await {
            tracing::error!("[BACKUP] backup cycle aborted: {}", e);
        }
        Ok(())
    }
}
