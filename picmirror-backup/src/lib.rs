//! Post-upload backup of images to secondary destinations.
//!
//! Before the primary upload runs, [`BackupOrchestrator::capture`] copies the
//! in-flight payloads. After it succeeds, [`BackupOrchestrator::run_cycle`]
//! re-uploads those payloads to every configured destination concurrently,
//! each in its own [`context::IsolatedContext`], and clears the copies once
//! every destination has finished. Failures are logged and reported, never
//! propagated to the primary upload.

pub mod cache;
pub mod config;
pub mod context;
pub mod form;
pub mod invoker;
pub mod manager;
pub mod plugin;
pub mod task;
pub mod transport;
pub mod types;

pub use cache::PayloadCache;
pub use config::{BackupConfig, CONFIG_NAMESPACE, PLUGIN_ID};
pub use context::{ContextSynthesizer, IsolatedContext};
pub use invoker::DestinationInvoker;
pub use manager::BackupOrchestrator;
pub use plugin::BackupPlugin;
pub use task::BackupTask;
pub use transport::TransportProvider;
pub use types::{BackupOutcome, CachedFile, CycleReport, CycleState, SkipReason};

#[cfg(feature = "http-transport")]
pub use transport::HttpTransport;
