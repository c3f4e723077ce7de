use crate::task::BackupTask;
use crate::transport::{resolve_transport, TransportProvider};
use picmirror::{FileRecord, HostHandles, MirrorError, Result, Transport, UploadContext};
use std::sync::Arc;

/// An [`UploadContext`] built for one destination of one cycle.
///
/// Shares only the host's read-only handles; the output buffer is freshly
/// allocated and owned by this value.
pub struct IsolatedContext {
    provider: TransportProvider,
    context: UploadContext,
}

impl IsolatedContext {
    pub fn provider(&self) -> TransportProvider {
        self.provider
    }

    pub fn context(&self) -> &UploadContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut UploadContext {
        &mut self.context
    }

    pub fn output(&self) -> &[FileRecord] {
        &self.context.output
    }

    pub fn into_output(self) -> Vec<FileRecord> {
        self.context.output
    }
}

/// Builds per-destination contexts from the host's shared handles.
#[derive(Clone, Default)]
pub struct ContextSynthesizer {
    external: Option<Arc<dyn Transport>>,
}

impl ContextSynthesizer {
    /// `external` is the last-resort transport for hosts that expose none.
    pub fn new(external: Option<Arc<dyn Transport>>) -> Self {
        ContextSynthesizer { external }
    }

    #[cfg(feature = "http-transport")]
    pub fn with_http_fallback() -> Self {
        Self::new(Some(Arc::new(crate::transport::HttpTransport::new())))
    }

    pub fn has_external_transport(&self) -> bool {
        self.external.is_some()
    }

    pub fn synthesize(&self, handles: &HostHandles, task: &BackupTask) -> Result<IsolatedContext> {
        let (provider, transport) =
            resolve_transport(&handles.transports, self.external.as_ref())
                .ok_or_else(|| MirrorError::TransportUnavailable(task.destination_id.clone()))?;

        if provider != TransportProvider::PrimaryHostTransport {
            tracing::warn!(
                "[BACKUP {}] host transport missing, using {}",
                task.destination_id,
                provider.as_str()
            );
        }

        let output = task
            .files()
            .map(|(cached, expected_name)| cached.to_record(expected_name))
            .collect();

        Ok(IsolatedContext {
            provider,
            context: UploadContext::new(
                Arc::clone(&handles.config),
                transport,
                handles.base_dir.clone(),
                output,
            ),
        })
    }
}
