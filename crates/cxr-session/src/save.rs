//! Save orchestration: what gets persisted, and when
//!
//! A Clinician's judgment is per-study, so a Clinician save replicates the
//! current form values across one record per view of the study; a Data
//! Scientist save writes exactly one record for the displayed image.
//! Saves fire on every field edit (partial, so in-progress work survives
//! an unexpected exit) and right before a navigation move commits.

use crate::catalog::ImageRef;
use crate::form::FormState;
use chrono::{DateTime, Utc};
use cxr_store::{AnnotationId, AnnotationRecord, UserRole};
use std::collections::BTreeMap;

/// What a single save call covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveScope {
    /// One record for the displayed image.
    SingleImage,
    /// One record per view of the displayed study, sharing the same
    /// form values.
    AllViewsInStudy,
}

impl SaveScope {
    /// The scope a role saves with, for both autosave and navigation.
    #[inline]
    #[must_use]
    pub fn for_role(role: UserRole) -> Self {
        match role {
            UserRole::Clinician => SaveScope::AllViewsInStudy,
            UserRole::DataScientist => SaveScope::SingleImage,
        }
    }
}

/// Write-time ISO-8601 timestamp, second precision.
#[must_use]
pub(crate) fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Seconds elapsed since the image/study was first shown.
#[must_use]
pub(crate) fn elapsed_seconds(started: Option<DateTime<Utc>>) -> Option<f64> {
    started.map(|t| (Utc::now() - t).num_milliseconds() as f64 / 1000.0)
}

/// Build the records for one save: one per target image, all sharing the
/// current form values. Each record gets a fresh id and the same write
/// timestamp.
#[must_use]
pub(crate) fn build_records(
    form: &FormState,
    images: &[&ImageRef],
    username: &str,
    role: UserRole,
    elapsed: Option<f64>,
) -> Vec<AnnotationRecord> {
    let timestamp = now_timestamp();
    let fields: BTreeMap<String, Option<String>> = form
        .schema()
        .fields()
        .iter()
        .map(|f| {
            (
                f.column.to_string(),
                form.get(f.form_key).map(str::to_string),
            )
        })
        .collect();

    images
        .iter()
        .map(|image| AnnotationRecord {
            annotation_id: AnnotationId::new(),
            timestamp: timestamp.clone(),
            username: username.to_string(),
            user_role: role,
            elapsed_seconds: elapsed,
            study_key: image.study_key.clone(),
            image_id: image.image_id.clone(),
            image_path: image.image_path.clone(),
            fields: fields.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::schema_for;

    fn image(study: &str, id: &str) -> ImageRef {
        ImageRef {
            study_key: study.to_string(),
            image_id: id.to_string(),
            image_path: format!("/d/{study}/{id}.dcm"),
        }
    }

    #[test]
    fn scope_follows_role() {
        assert_eq!(
            SaveScope::for_role(UserRole::Clinician),
            SaveScope::AllViewsInStudy
        );
        assert_eq!(
            SaveScope::for_role(UserRole::DataScientist),
            SaveScope::SingleImage
        );
    }

    #[test]
    fn records_replicate_form_values_across_views() {
        let mut form = FormState::new(schema_for(UserRole::Clinician));
        form.set("consolidation", Some("Left".to_string())).unwrap();

        let views = [image("S1", "a"), image("S1", "b")];
        let refs: Vec<&ImageRef> = views.iter().collect();
        let records = build_records(&form, &refs, "bob", UserRole::Clinician, Some(3.5));

        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.username, "bob");
            assert_eq!(record.fields["Consolidation"], Some("Left".to_string()));
            assert_eq!(record.fields["Atelectasis"], None);
            assert_eq!(record.elapsed_seconds, Some(3.5));
        }
        assert_eq!(records[0].timestamp, records[1].timestamp);
        assert_ne!(records[0].annotation_id, records[1].annotation_id);
        assert_eq!(records[1].image_path, "/d/S1/b.dcm");
    }

    #[test]
    fn partial_forms_persist_nulls() {
        let form = FormState::new(schema_for(UserRole::DataScientist));
        let target = image("S1", "a");
        let records = build_records(&form, &[&target], "carol", UserRole::DataScientist, None);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fields.len(), 9);
        assert!(records[0].fields.values().all(Option::is_none));
        assert_eq!(records[0].elapsed_seconds, None);
    }
}
