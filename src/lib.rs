//! # picmirror
//!
//! Host-side model for an image upload pipeline that replicates each
//! successful upload to secondary destinations.
//!
//! This crate defines what the host provides: file records, the uploader
//! registry, the configuration store, the HTTP transport and lifecycle hooks.
//! The replication logic itself lives in the companion `picmirror-backup`
//! crate.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use picmirror::{ConfigStore, FileRecord, MemoryConfigStore};
//! use serde_json::json;
//!
//! # fn main() -> picmirror::Result<()> {
//! let store = MemoryConfigStore::new();
//! store.set("picBed.uploader", json!("github"))?;
//! assert_eq!(store.get("picBed.uploader"), Some(json!("github")));
//!
//! let record = FileRecord::new("cat.png").with_buffer(vec![0x89, 0x50, 0x4e, 0x47]);
//! assert_eq!(record.payload_bytes().map(|b| b.len()), Some(4));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod host;
pub mod registry;
pub mod store;
pub mod types;

pub use error::{FailureKind, MirrorError, Result};
pub use host::{
    config_section, ConfigStore, HandlerError, HandlerResult, HookRegistry, HostContext,
    HostHandles, HostTransports, Transport, TransportRequest, TransportResponse, UploadContext,
    UploadHook, Uploader, UploaderRegistry,
};
pub use registry::{HookChain, MemoryUploaderRegistry};
pub use store::{JsonFileConfigStore, MemoryConfigStore};
pub use types::*;
