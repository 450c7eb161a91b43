//! CXR Session - Annotation Session Core
//!
//! The state behind a reviewer's annotation session:
//! - Static per-role form schemas (Clinician, Data Scientist)
//! - Form state with a completeness predicate that gates navigation
//! - A save-before-move navigation state machine with per-category
//!   debounce and save-in-flight tracking
//! - Save orchestration (single image vs. all views of a study)
//! - Loading of persisted annotations when the cursor moves
//! - Window/level display state fed by an external metadata provider
//!
//! # Example
//!
//! ```rust,ignore
//! use cxr_session::{Direction, ImageCatalog, NavCategory, SessionContext};
//! use cxr_store::UserRole;
//!
//! let mut session = SessionContext::new(dir, "carol", UserRole::DataScientist, catalog);
//! session.edit_field("intubated", Some("Yes".into()))?;
//! // ... after all nine fields are set:
//! let outcome = session.move_cursor(NavCategory::Image, Direction::Next);
//! ```

#![warn(unreachable_pub)]

pub mod catalog;
pub mod error;
pub mod form;
pub mod loader;
pub mod navigation;
pub mod save;
pub mod schema;
pub mod session;
pub mod window;

// Re-exports for convenience
pub use catalog::{ImageCatalog, ImageMetadata, ImageRef, MetadataProvider};
pub use error::{MetadataError, SessionError};
pub use form::FormState;
pub use loader::load_annotations_for_image;
pub use navigation::{Cursor, Direction, MoveOutcome, NavCategory, NavRejection};
pub use save::SaveScope;
pub use schema::{schema_for, FieldDef, FormSchema};
pub use session::{SessionConfig, SessionContext, SessionFeedback};
pub use window::WindowState;

// The roles travel with the records; re-export so embedders need only
// this crate.
pub use cxr_store::UserRole;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
