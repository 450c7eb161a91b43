//! Error types for the session core
//!
//! Store failures degrade to reported feedback rather than propagating
//! through the navigation state machine; the errors here are the ones a
//! caller can actually act on at the API boundary.

/// Session-level failure.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Record store gave up after its retry budget.
    #[error("store error: {0}")]
    Store(#[from] cxr_store::StoreError),

    /// A field-edit event named a key outside the role's schema.
    #[error("unknown form field: {0}")]
    UnknownField(String),

    /// A field-edit event named an option outside the field's allowed set.
    /// The form is left unchanged.
    #[error("{value:?} is not an allowed option for field {field}")]
    InvalidFieldValue { field: String, value: String },

    /// The image metadata provider could not resolve an image.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// Failure from the external image metadata provider.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MetadataError {
    /// The provider cannot resolve the given image path.
    #[error("cannot resolve image metadata for {path}: {reason}")]
    Unresolved { path: String, reason: String },
}
