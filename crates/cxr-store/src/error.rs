//! Error types for the record store
//!
//! Transient OS-level write failures are retried inside the store and only
//! surface as [`StoreError::RetriesExhausted`]; a missing or unreadable
//! store file is not an error at all (it reads as an empty table).

/// Record store failure, reported after the internal retry loop gives up.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Atomic write failed on every attempt; the previously persisted
    /// table is untouched.
    #[error("failed to save annotations after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    /// The row table could not be encoded. Not retried: the payload will
    /// not get better on a second attempt.
    #[error("failed to encode annotation table: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether re-triggering the save (e.g. by re-clicking navigation) may
    /// succeed.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::RetriesExhausted { .. })
    }
}

/// Transient classification for a write-path I/O error.
///
/// Lock contention and permission races from a concurrent writer show up
/// under different kinds across platforms, so everything except the
/// clearly permanent kinds counts as transient.
#[inline]
#[must_use]
pub(crate) fn is_transient(kind: std::io::ErrorKind) -> bool {
    !matches!(
        kind,
        std::io::ErrorKind::NotFound | std::io::ErrorKind::InvalidInput
    )
}
