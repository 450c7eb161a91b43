//! Read-modify-write record store with atomic replace
//!
//! One [`RecordStore`] owns one (username, role, day) file. Saves follow
//! the replace-then-append protocol: read the persisted table (missing or
//! unreadable reads as empty), drop rows superseded by the incoming batch,
//! write the union to a fresh temporary file in the same directory, then
//! rename over the destination. Readers never observe a partially written
//! file; a failed attempt leaves the previous table intact.
//!
//! Transient OS-level failures (lock contention, permission races from a
//! concurrent writer) are retried with exponential backoff before the
//! error is surfaced.

use crate::error::{is_transient, StoreError};
use crate::record::{AnnotationRecord, UserRole};
use crate::snapshot::StoreSnapshot;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Retry schedule for transient write failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts before giving up.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles each further attempt.
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(400),
        }
    }
}

impl RetryPolicy {
    /// Policy that never sleeps and never re-tries.
    #[inline]
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            max_attempts: 1,
            base_backoff: Duration::ZERO,
        }
    }

    /// Backoff to sleep after the given zero-based failed attempt, or
    /// `None` when the attempt was the last one.
    #[must_use]
    pub fn backoff_after(&self, attempt: u32) -> Option<Duration> {
        if attempt + 1 >= self.max_attempts {
            None
        } else {
            Some(self.base_backoff * 2u32.saturating_pow(attempt))
        }
    }
}

/// Deterministic store file name for one (username, role, day).
#[must_use]
pub fn store_file_name(username: &str, role: UserRole, day: NaiveDate) -> String {
    format!(
        "annotations_{username}_{}_{}.json",
        role.file_token(),
        day.format("%Y%m%d")
    )
}

/// One attempt's failure, before retry classification.
enum AttemptFailure {
    Encode(serde_json::Error),
    Io(std::io::Error),
}

/// Handle on one per-user, per-role, per-day store file.
///
/// Keeps an in-memory snapshot of the persisted table so reads after a
/// successful save do not hit storage again. The file is created lazily on
/// first save.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    retry: RetryPolicy,
    snapshot: StoreSnapshot,
    role: UserRole,
}

impl RecordStore {
    /// Open the store for one user/role/day under `dir`, loading whatever
    /// is already persisted (an absent file reads as an empty table).
    #[must_use]
    pub fn open(dir: &Path, username: &str, role: UserRole, day: NaiveDate) -> Self {
        Self::open_with_retry(dir, username, role, day, RetryPolicy::default())
    }

    /// Open with a custom retry schedule.
    #[must_use]
    pub fn open_with_retry(
        dir: &Path,
        username: &str,
        role: UserRole,
        day: NaiveDate,
        retry: RetryPolicy,
    ) -> Self {
        let path = dir.join(store_file_name(username, role, day));
        let snapshot = read_table(&path, role);
        Self {
            path,
            retry,
            snapshot,
            role,
        }
    }

    /// Path of the persisted file.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current in-memory snapshot.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &StoreSnapshot {
        &self.snapshot
    }

    /// Re-read the persisted table into the cached snapshot.
    pub fn reload(&mut self) -> &StoreSnapshot {
        self.snapshot = read_table(&self.path, self.role);
        &self.snapshot
    }

    /// Insert-or-replace the given records and persist atomically.
    ///
    /// For each record, any existing row with the same (`image_path`,
    /// `username`) is removed before the new row is appended; the combined
    /// table replaces the file via temp-file-then-rename. On success the
    /// cached snapshot reflects the persisted state. On failure the
    /// previous persisted table and the cached snapshot are both
    /// unchanged.
    pub fn upsert(&mut self, records: Vec<AnnotationRecord>) -> Result<&StoreSnapshot, StoreError> {
        if records.is_empty() {
            return Ok(&self.snapshot);
        }

        let mut attempt = 0u32;
        loop {
            match self.try_upsert(&records) {
                Ok(combined) => {
                    tracing::debug!(
                        path = %self.path.display(),
                        rows = combined.len(),
                        "annotation table committed"
                    );
                    self.snapshot = combined;
                    return Ok(&self.snapshot);
                }
                Err(AttemptFailure::Encode(err)) => {
                    tracing::error!(path = %self.path.display(), error = %err, "annotation table not encodable");
                    return Err(StoreError::Encode(err));
                }
                Err(AttemptFailure::Io(err))
                    if is_transient(err.kind()) && attempt + 1 < self.retry.max_attempts =>
                {
                    let backoff = self.retry.backoff_after(attempt).unwrap_or(Duration::ZERO);
                    tracing::warn!(
                        path = %self.path.display(),
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "transient store failure, retrying"
                    );
                    std::thread::sleep(backoff);
                    attempt += 1;
                }
                Err(AttemptFailure::Io(err)) => {
                    tracing::error!(
                        path = %self.path.display(),
                        attempts = attempt + 1,
                        error = %err,
                        "giving up on annotation save"
                    );
                    return Err(StoreError::RetriesExhausted {
                        attempts: attempt + 1,
                        source: err,
                    });
                }
            }
        }
    }

    /// One read-modify-write attempt. Any failure aborts the attempt
    /// before the rename, so the destination is never left half-written.
    fn try_upsert(&self, records: &[AnnotationRecord]) -> Result<StoreSnapshot, AttemptFailure> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(AttemptFailure::Io)?;
        }

        let mut combined = read_table(&self.path, self.role);
        combined.upsert(records.to_vec());

        let rows: Vec<Map<String, Value>> =
            combined.rows().iter().map(AnnotationRecord::to_row).collect();
        let payload = serde_json::to_vec_pretty(&rows).map_err(AttemptFailure::Encode)?;

        write_atomic(&self.path, &payload).map_err(AttemptFailure::Io)?;
        Ok(combined)
    }
}

/// Load the persisted table, or an empty table if the file is missing or
/// unreadable. A parse failure is logged but deliberately non-fatal: the
/// first successful save rewrites the file.
#[must_use]
pub fn read_table(path: &Path, role: UserRole) -> StoreSnapshot {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return StoreSnapshot::new();
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "store file unreadable, treating as empty");
            return StoreSnapshot::new();
        }
    };

    let rows: Vec<Map<String, Value>> = match serde_json::from_slice(&bytes) {
        Ok(rows) => rows,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "store file unparsable, treating as empty");
            return StoreSnapshot::new();
        }
    };

    StoreSnapshot::from_rows(
        rows.iter()
            .filter_map(|row| AnnotationRecord::from_row(row, role))
            .collect(),
    )
}

/// Write the payload to a fresh temporary file in the destination's
/// directory, then rename over the destination.
fn write_atomic(path: &Path, payload: &[u8]) -> Result<(), std::io::Error> {
    let tmp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
    let result = (|| {
        let mut tmp = std::fs::File::create(&tmp_path)?;
        tmp.write_all(payload)?;
        tmp.sync_all()?;
        drop(tmp);
        std::fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}
