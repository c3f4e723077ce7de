use crate::context::ContextSynthesizer;
use crate::task::BackupTask;
use crate::types::{BackupOutcome, CachedFile};
use picmirror::{FileRecord, HostHandles, MirrorError, PrimaryResult, Result, ResultItem};
use std::sync::Arc;
use std::time::Instant;

/// Drives a single destination's upload and reduces it to a [`BackupOutcome`].
#[derive(Clone)]
pub struct DestinationInvoker {
    handles: HostHandles,
    synthesizer: ContextSynthesizer,
    verbose: bool,
}

impl DestinationInvoker {
    pub fn new(handles: HostHandles, synthesizer: ContextSynthesizer, verbose: bool) -> Self {
        Self {
            handles,
            synthesizer,
            verbose,
        }
    }

    /// Back up the cached files to `destination_id`. Never fails: every error
    /// becomes an unsuccessful outcome.
    pub async fn invoke(
        &self,
        destination_id: &str,
        cached_files: Arc<[CachedFile]>,
        primary_results: &[PrimaryResult],
    ) -> BackupOutcome {
        let started = Instant::now();
        let task = BackupTask::new(destination_id, cached_files, primary_results);

        let result = self.run(&task).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(items) => BackupOutcome::success(destination_id, items, elapsed_ms),
            Err(e) => {
                if self.verbose {
                    tracing::info!(
                        "[BACKUP {}] stopped with {} after {}ms",
                        destination_id,
                        e.kind(),
                        elapsed_ms
                    );
                }
                BackupOutcome::failure(destination_id, &e, elapsed_ms)
            }
        }
    }

    async fn run(&self, task: &BackupTask) -> Result<Vec<ResultItem>> {
        let destination = task.destination_id.as_str();
        let uploader = self
            .handles
            .uploaders
            .get(destination)
            .ok_or_else(|| MirrorError::DestinationNotFound(destination.to_string()))?;

        if self.verbose {
            tracing::info!(
                "[BACKUP {}] starting backup of {} cached files",
                destination,
                task.len()
            );
        }

        let mut ctx = self.synthesizer.synthesize(&self.handles, task)?;

        if self.verbose {
            tracing::info!(
                "[BACKUP {}] context ready (transport: {}), invoking {}",
                destination,
                ctx.provider().as_str(),
                uploader.name()
            );
            for (cached, expected_name) in task.files() {
                tracing::info!(
                    "[BACKUP {}] input {} ({})",
                    destination,
                    expected_name,
                    cached.describe_payload()
                );
            }
        }

        uploader
            .handle(ctx.context_mut())
            .await
            .map_err(|e| MirrorError::invocation(destination, e))?;

        let output = ctx.into_output();

        if self.verbose {
            tracing::info!(
                "[BACKUP {}] uploader finished with {} items",
                destination,
                output.len()
            );
            for (i, item) in output.iter().enumerate() {
                tracing::info!(
                    "[BACKUP {}] item {}: {} has_img_url={} has_url={}",
                    destination,
                    i + 1,
                    item.file_name,
                    item.img_url.is_some(),
                    item.url.is_some()
                );
            }
        }

        validate_output(destination, &output)?;
        Ok(output.iter().map(ResultItem::from).collect())
    }
}

/// An uploader that returns without error but yields no URL has still failed.
fn validate_output(destination: &str, output: &[FileRecord]) -> Result<()> {
    if output.iter().any(|item| item.resolved_url().is_some()) {
        Ok(())
    } else {
        Err(MirrorError::NoValidUrlReturned(destination.to_string()))
    }
}
