//! CXR Store - Annotation Record Store
//!
//! Persistence layer for per-user chest X-ray annotation records:
//! - One table-structured file per (username, role, day)
//! - Upsert-by-image with dedup-on-save (latest state, not edit history)
//! - Atomic temp-file-then-rename replacement
//! - Bounded retry with exponential backoff on transient write failures
//!
//! # Example
//!
//! ```rust,ignore
//! use cxr_store::{RecordStore, UserRole};
//!
//! let mut store = RecordStore::open(dir, "carol", UserRole::DataScientist, today);
//! store.upsert(vec![record])?;
//! let latest = store.snapshot().most_recent("/data/x.dcm", "carol");
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod record;
pub mod snapshot;
pub mod store;

// Re-exports for convenience
pub use error::StoreError;
pub use record::{AnnotationId, AnnotationRecord, UserRole};
pub use snapshot::StoreSnapshot;
pub use store::{read_table, store_file_name, RecordStore, RetryPolicy};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
