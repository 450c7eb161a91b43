//! In-memory view of one store file

use crate::record::AnnotationRecord;

/// The rows of one (username, role, day) store file, in file order.
///
/// Under the dedup-on-save invariant each (`image_path`, `username`) pair
/// has at most one row, but the snapshot tolerates legacy duplicates:
/// lookups always resolve to the row with the greatest timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    rows: Vec<AnnotationRecord>,
}

impl StoreSnapshot {
    /// Empty table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from rows as read from storage.
    #[inline]
    #[must_use]
    pub fn from_rows(rows: Vec<AnnotationRecord>) -> Self {
        Self { rows }
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows, in file order.
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[AnnotationRecord] {
        &self.rows
    }

    /// Most recent row for an (`image_path`, `username`) pair, if any.
    ///
    /// Timestamps are fixed-format ISO-8601, so lexicographic order is
    /// chronological order.
    #[must_use]
    pub fn most_recent(&self, image_path: &str, username: &str) -> Option<&AnnotationRecord> {
        self.rows
            .iter()
            .filter(|r| r.matches(image_path, username))
            .max_by(|a, b| a.timestamp.cmp(&b.timestamp))
    }

    /// Named field column of the most recent matching row.
    #[must_use]
    pub fn field_value(&self, image_path: &str, username: &str, column: &str) -> Option<&str> {
        self.most_recent(image_path, username)
            .and_then(|r| r.fields.get(column))
            .and_then(|v| v.as_deref())
    }

    /// Replace-then-append: drop every row whose key matches one of the
    /// incoming records, then append the incoming records.
    pub fn upsert(&mut self, records: Vec<AnnotationRecord>) {
        self.rows.retain(|existing| {
            !records
                .iter()
                .any(|new| existing.matches(&new.image_path, &new.username))
        });
        self.rows.extend(records);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{AnnotationId, UserRole};
    use std::collections::BTreeMap;

    fn record(image_path: &str, username: &str, timestamp: &str) -> AnnotationRecord {
        AnnotationRecord {
            annotation_id: AnnotationId::new(),
            timestamp: timestamp.to_string(),
            username: username.to_string(),
            user_role: UserRole::DataScientist,
            elapsed_seconds: None,
            study_key: "S1".to_string(),
            image_id: "D1".to_string(),
            image_path: image_path.to_string(),
            fields: BTreeMap::new(),
        }
    }

    #[test]
    fn upsert_replaces_matching_rows() {
        let mut snapshot = StoreSnapshot::from_rows(vec![
            record("A", "bob", "2025-07-18T08:00:00"),
            record("B", "bob", "2025-07-18T08:01:00"),
        ]);

        let replacement = record("A", "bob", "2025-07-18T09:00:00");
        let replacement_id = replacement.annotation_id;
        snapshot.upsert(vec![replacement]);

        assert_eq!(snapshot.len(), 2);
        let row = snapshot.most_recent("A", "bob").unwrap();
        assert_eq!(row.annotation_id, replacement_id);
    }

    #[test]
    fn upsert_keeps_other_users_rows() {
        let mut snapshot = StoreSnapshot::from_rows(vec![
            record("A", "bob", "2025-07-18T08:00:00"),
            record("A", "alice", "2025-07-18T08:00:00"),
        ]);

        snapshot.upsert(vec![record("A", "bob", "2025-07-18T09:00:00")]);

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.most_recent("A", "alice").is_some());
    }

    #[test]
    fn most_recent_tolerates_legacy_duplicates() {
        let snapshot = StoreSnapshot::from_rows(vec![
            record("A", "bob", "2025-07-18T08:00:00"),
            record("A", "bob", "2025-07-18T10:00:00"),
            record("A", "bob", "2025-07-18T09:00:00"),
        ]);

        let row = snapshot.most_recent("A", "bob").unwrap();
        assert_eq!(row.timestamp, "2025-07-18T10:00:00");
    }

    #[test]
    fn most_recent_misses_return_none() {
        let snapshot = StoreSnapshot::from_rows(vec![record("A", "bob", "2025-07-18T08:00:00")]);
        assert!(snapshot.most_recent("A", "alice").is_none());
        assert!(snapshot.most_recent("B", "bob").is_none());
    }

    #[test]
    fn field_value_reads_latest_row() {
        let mut older = record("A", "bob", "2025-07-18T08:00:00");
        older
            .fields
            .insert("Intubated".to_string(), Some("Yes".to_string()));
        let mut newer = record("A", "bob", "2025-07-18T09:00:00");
        newer
            .fields
            .insert("Intubated".to_string(), Some("No".to_string()));

        let snapshot = StoreSnapshot::from_rows(vec![older, newer]);
        assert_eq!(snapshot.field_value("A", "bob", "Intubated"), Some("No"));
        assert_eq!(snapshot.field_value("A", "bob", "PhiPresent"), None);
    }
}
