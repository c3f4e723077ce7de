use crate::cache::PayloadCache;
use crate::config::{current_uploader, BackupConfig};
use crate::context::ContextSynthesizer;
use crate::invoker::DestinationInvoker;
use crate::types::{BackupOutcome, CachedFile, CycleReport, CycleState, SkipReason};
use chrono::Utc;
use picmirror::{DestinationId, HostContext, HostHandles, MirrorError, PrimaryResult};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Owns the payload cache and runs one backup cycle per primary upload.
pub struct BackupOrchestrator {
    synthesizer: ContextSynthesizer,
    cache: Mutex<PayloadCache>,
    state: Mutex<CycleState>,
}

/// Releases the cycle's snapshot and returns to `Idle` when a cycle ends, on
/// every path including unwinding. A capture made by a later upload while
/// this cycle ran is left in place for its own cycle.
struct CycleGuard<'a> {
    orchestrator: &'a BackupOrchestrator,
    cycle_id: Uuid,
    cached: Arc<[CachedFile]>,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        match self.orchestrator.cache().release(&self.cached) {
            Some(released) => {
                self.orchestrator.set_state(CycleState::Idle);
                if released > 0 {
                    tracing::debug!(
                        "[BACKUP] cycle {} released {} cached files",
                        self.cycle_id,
                        released
                    );
                }
            }
            None => tracing::debug!(
                "[BACKUP] cycle {} finished, newer capture kept",
                self.cycle_id
            ),
        }
    }
}

impl BackupOrchestrator {
    pub fn new(synthesizer: ContextSynthesizer) -> Arc<Self> {
        Arc::new(Self {
            synthesizer,
            cache: Mutex::new(PayloadCache::new()),
            state: Mutex::new(CycleState::Idle),
        })
    }

    /// Orchestrator whose contexts fall back to a reqwest client when the
    /// host exposes no transport.
    #[cfg(feature = "http-transport")]
    pub fn with_http_fallback() -> Arc<Self> {
        Self::new(ContextSynthesizer::with_http_fallback())
    }

    pub fn state(&self) -> CycleState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: CycleState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    fn cache(&self) -> MutexGuard<'_, PayloadCache> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Read-only view of what is currently cached.
    pub fn cached_files(&self) -> Arc<[CachedFile]> {
        self.cache().snapshot()
    }

    /// Before-upload stage: copy the in-flight payloads if any backup
    /// destination is configured. Returns whether anything was captured.
    pub fn capture(&self, host: &HostContext) -> bool {
        let config = BackupConfig::load(host.handles.config.as_ref());
        if !config.has_destinations() {
            return false;
        }

        self.set_state(CycleState::Capturing);
        let snapshot = {
            let mut cache = self.cache();
            cache.capture(&host.output);
            cache.snapshot()
        };
        self.set_state(CycleState::AwaitingPrimary);

        if config.verbose_logging {
            tracing::info!("[BACKUP] cached {} files", snapshot.len());
            for (i, cached) in snapshot.iter().enumerate() {
                tracing::info!(
                    "[BACKUP] cached file {}: {} ({})",
                    i + 1,
                    cached.file_name,
                    cached.describe_payload()
                );
            }
        }
        !snapshot.is_empty()
    }

    /// After-upload stage: back up to every configured destination and wait
    /// for all of them. The cycle's cached payloads are released when this
    /// returns.
    pub async fn run_cycle(&self, host: &HostContext) -> CycleReport {
        let cached = self.cached_files();
        self.run(host.handles.clone(), PrimaryResult::collect(&host.output), cached)
            .await
    }

    /// Fire-and-forget variant of [`run_cycle`](Self::run_cycle).
    ///
    /// The cached payloads are taken before the task is spawned, so a capture
    /// for the next upload cannot leak into this cycle.
    pub fn spawn_cycle(self: &Arc<Self>, host: &HostContext) -> JoinHandle<CycleReport> {
        let orchestrator = Arc::clone(self);
        let handles = host.handles.clone();
        let primary_results = PrimaryResult::collect(&host.output);
        let cached = self.cached_files();
        tokio::spawn(async move { orchestrator.run(handles, primary_results, cached).await })
    }

    async fn run(
        &self,
        handles: HostHandles,
        primary_results: Vec<PrimaryResult>,
        cached: Arc<[CachedFile]>,
    ) -> CycleReport {
        let cycle_id = Uuid::new_v4();
        let started_at = Utc::now();
        let _guard = CycleGuard {
            orchestrator: self,
            cycle_id,
            cached: Arc::clone(&cached),
        };

        let skipped = |reason: SkipReason| CycleReport {
            cycle_id,
            started_at,
            finished_at: Utc::now(),
            skipped: Some(reason),
            outcomes: Vec::new(),
        };

        let config = BackupConfig::load(handles.config.as_ref());
        let primary_id = current_uploader(handles.config.as_ref());
        let destinations = config.effective_destinations(primary_id.as_deref());

        if destinations.is_empty() {
            if config.verbose_logging {
                tracing::info!("[BACKUP] no backup destinations configured, skipping");
            }
            return skipped(SkipReason::NoDestinations);
        }

        if cached.is_empty() {
            tracing::error!("[BACKUP] {}", MirrorError::CacheMissing);
            return skipped(SkipReason::CacheMissing);
        }

        if !primary_results.iter().any(|r| r.resolved_url.is_some()) {
            if config.verbose_logging {
                tracing::info!("[BACKUP] primary upload failed, skipping backup");
            }
            return skipped(SkipReason::PrimaryFailed);
        }

        tracing::info!(
            "[BACKUP] primary {} succeeded, backing up to {} destinations",
            primary_id.as_deref().unwrap_or("uploader"),
            destinations.len()
        );
        if config.verbose_logging {
            for (i, primary) in primary_results.iter().enumerate() {
                tracing::info!(
                    "[BACKUP] primary file {}: {} -> {}",
                    i + 1,
                    primary.file_name,
                    primary.resolved_url.as_deref().unwrap_or("no URL")
                );
            }
        }

        self.set_state(CycleState::FanningOut);
        let invoker = DestinationInvoker::new(
            handles,
            self.synthesizer.clone(),
            config.verbose_logging,
        );
        let outcomes = fan_out(&invoker, destinations, cached, primary_results.into()).await;

        self.set_state(CycleState::Aggregating);
        let report = CycleReport {
            cycle_id,
            started_at,
            finished_at: Utc::now(),
            skipped: None,
            outcomes,
        };
        log_report(&report);
        report
    }
}

/// Run every destination as its own task and wait for all of them, whatever
/// their result. Outcomes come back in configuration order.
async fn fan_out(
    invoker: &DestinationInvoker,
    destinations: Vec<DestinationId>,
    cached: Arc<[CachedFile]>,
    primary_results: Arc<[PrimaryResult]>,
) -> Vec<BackupOutcome> {
    let tasks: Vec<(DestinationId, JoinHandle<BackupOutcome>)> = destinations
        .into_iter()
        .map(|destination_id| {
            let invoker = invoker.clone();
            let cached = Arc::clone(&cached);
            let primary_results = Arc::clone(&primary_results);
            let id = destination_id.clone();
            let handle =
                tokio::spawn(async move { invoker.invoke(&id, cached, &primary_results).await });
            (destination_id, handle)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(tasks.len());
    for (destination_id, handle) in tasks {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let reason = if e.is_panic() {
                    "upload task panicked"
                } else {
                    "upload task was cancelled"
                };
                let err = MirrorError::invocation(&destination_id, reason);
                BackupOutcome::failure(&destination_id, &err, 0)
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

fn log_report(report: &CycleReport) {
    tracing::info!(
        cycle_id = %report.cycle_id,
        "[BACKUP] backup finished: {}",
        report.summary()
    );

    for outcome in &report.outcomes {
        if outcome.succeeded {
            tracing::info!("[BACKUP {}] backup succeeded", outcome.destination_id);
            for (i, item) in outcome.result_items.iter().enumerate() {
                tracing::info!(
                    "[BACKUP {}] result {}: {}",
                    outcome.destination_id,
                    i + 1,
                    item.resolved_url.as_deref().unwrap_or("no URL")
                );
            }
        } else {
            tracing::warn!(
                "[BACKUP {}] backup failed: {}",
                outcome.destination_id,
                outcome.error_message.as_deref().unwrap_or("unknown error")
            );
        }
    }
}
