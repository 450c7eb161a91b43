//! Annotation records and their persisted row form
//!
//! One [`AnnotationRecord`] is one persisted row: author identity, subject
//! image identity, and the role-specific labeled fields. Rows are stored as
//! flat JSON objects whose identity columns carry a role suffix (`_cl` /
//! `_ds`), matching the per-role store files.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Reviewer role. Each role owns its own store files and field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum UserRole {
    Clinician,
    DataScientist,
}

impl UserRole {
    /// Display name, as persisted in the `UserRole_*` column.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Clinician => "Clinician",
            UserRole::DataScientist => "Data Scientist",
        }
    }

    /// Token used in store file names (no whitespace).
    #[inline]
    #[must_use]
    pub fn file_token(&self) -> &'static str {
        match self {
            UserRole::Clinician => "Clinician",
            UserRole::DataScientist => "DataScientist",
        }
    }

    /// Column suffix for the identity columns of this role's rows.
    #[inline]
    #[must_use]
    pub fn column_suffix(&self) -> &'static str {
        match self {
            UserRole::Clinician => "cl",
            UserRole::DataScientist => "ds",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Globally unique annotation identifier, generated at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AnnotationId(pub Uuid);

impl AnnotationId {
    /// Generate a new random id.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One persisted annotation row.
///
/// `image_path` + `username` is the natural key: the store keeps at most one
/// current row per key, superseding earlier rows on every save.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    /// Unique row id.
    pub annotation_id: AnnotationId,
    /// Write time, ISO-8601 with second precision.
    pub timestamp: String,
    /// Author username.
    pub username: String,
    /// Author role.
    pub user_role: UserRole,
    /// Seconds since the image/study was first shown, if tracked.
    pub elapsed_seconds: Option<f64>,
    /// Study the image belongs to.
    pub study_key: String,
    /// Image identifier within the study.
    pub image_id: String,
    /// Path of the image file; natural key for "same image".
    pub image_path: String,
    /// Labeled fields: persisted column name -> selected option (None = unset).
    pub fields: BTreeMap<String, Option<String>>,
}

impl AnnotationRecord {
    /// Whether this row is the current user's row for the given image.
    #[inline]
    #[must_use]
    pub fn matches(&self, image_path: &str, username: &str) -> bool {
        self.image_path == image_path && self.username == username
    }

    /// Flatten into the persisted row object.
    ///
    /// Identity columns carry the role suffix; field columns are stored
    /// under their persisted names, null when unset.
    #[must_use]
    pub fn to_row(&self) -> Map<String, Value> {
        let sfx = self.user_role.column_suffix();
        let mut row = Map::new();
        row.insert(
            "AnnotationID".to_string(),
            Value::String(self.annotation_id.to_string()),
        );
        row.insert(
            format!("Timestamp_{sfx}"),
            Value::String(self.timestamp.clone()),
        );
        row.insert(
            format!("Username_{sfx}"),
            Value::String(self.username.clone()),
        );
        row.insert(
            format!("UserRole_{sfx}"),
            Value::String(self.user_role.as_str().to_string()),
        );
        row.insert(
            format!("AnnotationElapsedTime_sec_{sfx}"),
            match self.elapsed_seconds {
                Some(secs) => serde_json::json!(secs),
                None => Value::Null,
            },
        );
        row.insert("study_icn".to_string(), Value::String(self.study_key.clone()));
        row.insert("dicom_id".to_string(), Value::String(self.image_id.clone()));
        row.insert(
            "image_path".to_string(),
            Value::String(self.image_path.clone()),
        );
        for (column, value) in &self.fields {
            row.insert(
                column.clone(),
                match value {
                    Some(v) => Value::String(v.clone()),
                    None => Value::Null,
                },
            );
        }
        row
    }

    /// Rebuild a record from a persisted row object.
    ///
    /// Tolerant of missing columns: absent identity columns become empty
    /// strings, absent or null field columns stay unset. Returns `None`
    /// only when the row has no `image_path` at all (not attributable to
    /// any image).
    #[must_use]
    pub fn from_row(row: &Map<String, Value>, role: UserRole) -> Option<Self> {
        let sfx = role.column_suffix();
        let image_path = row.get("image_path")?.as_str()?.to_string();

        let str_col = |name: &str| -> String {
            row.get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let annotation_id = row
            .get("AnnotationID")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(AnnotationId)
            .unwrap_or_default();

        let elapsed_seconds = row
            .get(format!("AnnotationElapsedTime_sec_{sfx}").as_str())
            .and_then(Value::as_f64);

        let identity = [
            "AnnotationID",
            "study_icn",
            "dicom_id",
            "image_path",
        ];
        let mut fields = BTreeMap::new();
        for (column, value) in row {
            if identity.contains(&column.as_str()) || column.ends_with(&format!("_{sfx}")) {
                continue;
            }
            fields.insert(column.clone(), value.as_str().map(str::to_string));
        }

        Some(Self {
            annotation_id,
            timestamp: str_col(&format!("Timestamp_{sfx}")),
            username: str_col(&format!("Username_{sfx}")),
            user_role: role,
            elapsed_seconds,
            study_key: str_col("study_icn"),
            image_id: str_col("dicom_id"),
            image_path,
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> AnnotationRecord {
        let mut fields = BTreeMap::new();
        fields.insert("Intubated".to_string(), Some("Yes".to_string()));
        fields.insert("PhiPresent".to_string(), None);
        AnnotationRecord {
            annotation_id: AnnotationId::new(),
            timestamp: "2025-07-18T09:30:00".to_string(),
            username: "carol".to_string(),
            user_role: UserRole::DataScientist,
            elapsed_seconds: Some(12.5),
            study_key: "S001".to_string(),
            image_id: "D001".to_string(),
            image_path: "/data/S001/D001.dcm".to_string(),
            fields,
        }
    }

    #[test]
    fn role_tokens() {
        assert_eq!(UserRole::Clinician.as_str(), "Clinician");
        assert_eq!(UserRole::DataScientist.as_str(), "Data Scientist");
        assert_eq!(UserRole::DataScientist.file_token(), "DataScientist");
        assert_eq!(UserRole::Clinician.column_suffix(), "cl");
    }

    #[test]
    fn annotation_id_unique() {
        assert_ne!(AnnotationId::new(), AnnotationId::new());
    }

    #[test]
    fn row_round_trip() {
        let record = sample_record();
        let row = record.to_row();

        assert_eq!(row["Username_ds"], "carol");
        assert_eq!(row["UserRole_ds"], "Data Scientist");
        assert_eq!(row["Intubated"], "Yes");
        assert!(row["PhiPresent"].is_null());

        let back = AnnotationRecord::from_row(&row, UserRole::DataScientist).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn from_row_tolerates_missing_columns() {
        let mut row = Map::new();
        row.insert(
            "image_path".to_string(),
            Value::String("/data/x.dcm".to_string()),
        );
        row.insert("Intubated".to_string(), Value::String("No".to_string()));

        let record = AnnotationRecord::from_row(&row, UserRole::DataScientist).unwrap();
        assert_eq!(record.image_path, "/data/x.dcm");
        assert_eq!(record.username, "");
        assert_eq!(record.fields["Intubated"], Some("No".to_string()));
        assert_eq!(record.elapsed_seconds, None);
    }

    #[test]
    fn from_row_requires_image_path() {
        let row = Map::new();
        assert!(AnnotationRecord::from_row(&row, UserRole::Clinician).is_none());
    }
}
