//! Static annotation form schemas
//!
//! One ordered field table per role, consulted everywhere a field list is
//! needed (rendering, completeness, save, load). Each entry pairs the
//! display label and form key with the persisted column name and the
//! allowed option strings.

use cxr_store::UserRole;
use once_cell::sync::Lazy;

/// One form field: label, key, persisted column, options, layout hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Label shown next to the control.
    pub label: &'static str,
    /// Key the presentation layer uses in field-edit events.
    pub form_key: &'static str,
    /// Column name in the persisted row.
    pub column: &'static str,
    /// Allowed option strings, in display order.
    pub options: &'static [&'static str],
    /// Whether the options render in a horizontal row.
    pub horizontal: bool,
}

impl FieldDef {
    /// Whether `value` is one of this field's allowed options.
    #[inline]
    #[must_use]
    pub fn allows(&self, value: &str) -> bool {
        self.options.contains(&value)
    }
}

/// The immutable field table for one role.
#[derive(Debug)]
pub struct FormSchema {
    role: UserRole,
    fields: Vec<FieldDef>,
}

impl FormSchema {
    fn new(role: UserRole, fields: Vec<FieldDef>) -> Self {
        Self { role, fields }
    }

    /// Role this schema belongs to.
    #[inline]
    #[must_use]
    pub fn role(&self) -> UserRole {
        self.role
    }

    /// Fields in display order.
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Number of fields.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no fields.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field by its form key.
    #[must_use]
    pub fn field(&self, form_key: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.form_key == form_key)
    }

    /// Look up a field by its persisted column name.
    #[must_use]
    pub fn field_by_column(&self, column: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.column == column)
    }
}

const LATERALITY: &[&str] = &["Left", "Right", "Bilateral", "None"];
const YES_NO: &[&str] = &["Yes", "No"];

static CLINICIAN: Lazy<FormSchema> = Lazy::new(|| {
    FormSchema::new(
        UserRole::Clinician,
        vec![
            FieldDef {
                label: "Select consistency:",
                form_key: "ards_likelihood",
                column: "ARDS_Likelihood_Score",
                options: &[
                    "1 - Highly inconsistent",
                    "2 - Somewhat inconsistent",
                    "3 - Somewhat consistent",
                    "4 - Highly consistent",
                ],
                horizontal: false,
            },
            FieldDef {
                label: "Diffuse alveolar damage:",
                form_key: "diffuse_damage",
                column: "DiffuseAlveolarDamage",
                options: LATERALITY,
                horizontal: true,
            },
            FieldDef {
                label: "Pleural space occupying lesion (e.g., PEFF, PTX):",
                form_key: "pleural_lesion",
                column: "PleuralSpaceOccupyingLesion",
                options: LATERALITY,
                horizontal: true,
            },
            FieldDef {
                label: "Pulmonary edema:",
                form_key: "pulmonary_edema",
                column: "PulmonaryEdema",
                options: LATERALITY,
                horizontal: true,
            },
            FieldDef {
                label: "Consolidation:",
                form_key: "consolidation",
                column: "Consolidation",
                options: LATERALITY,
                horizontal: true,
            },
            FieldDef {
                label: "Atelectasis:",
                form_key: "atelectasis",
                column: "Atelectasis",
                options: LATERALITY,
                horizontal: true,
            },
            FieldDef {
                label: "Normal Appearing Mediastinum?:",
                form_key: "mediastinum_findings",
                column: "FindingsMediastinum",
                options: YES_NO,
                horizontal: true,
            },
            FieldDef {
                label: "Sufficient quality for clinical analysis:",
                form_key: "sufficient_quality",
                column: "SufficientQuality",
                options: YES_NO,
                horizontal: true,
            },
            FieldDef {
                label: "Global ARDS Criteria:",
                form_key: "global_criteria",
                column: "GlobalARDSCriteria",
                options: YES_NO,
                horizontal: true,
            },
        ],
    )
});

static DATA_SCIENTIST: Lazy<FormSchema> = Lazy::new(|| {
    FormSchema::new(
        UserRole::DataScientist,
        vec![
            FieldDef {
                label: "Intubated (OETT or tracheostomy):",
                form_key: "intubated",
                column: "Intubated",
                options: YES_NO,
                horizontal: true,
            },
            FieldDef {
                label: "External support devices visible (e.g., ECG leads, brace):",
                form_key: "external_support_devices",
                column: "ExternalSupportDevices",
                options: YES_NO,
                horizontal: true,
            },
            FieldDef {
                label: "Implanted medical device visible (e.g., pacemaker, prosthetic):",
                form_key: "implanted_device",
                column: "ImplantedDevice",
                options: YES_NO,
                horizontal: true,
            },
            FieldDef {
                label: "Other foreign bodies present (e.g., shrapnel):",
                form_key: "foreign_bodies",
                column: "ForeignBodies",
                options: YES_NO,
                horizontal: true,
            },
            FieldDef {
                label: "Image artifacts/quality issues present:",
                form_key: "image_artifacts",
                column: "ImageArtifacts",
                options: YES_NO,
                horizontal: true,
            },
            FieldDef {
                label: "Annotations or text present:",
                form_key: "annotations_text_present",
                column: "AnnotationsTextPresent",
                options: &["No", "Few characters", "Complete words"],
                horizontal: true,
            },
            FieldDef {
                label: "PHI present?",
                form_key: "phi_present",
                column: "PhiPresent",
                options: YES_NO,
                horizontal: true,
            },
            FieldDef {
                label: "Post-processing image present?",
                form_key: "post_processing",
                column: "PostProcessing",
                options: YES_NO,
                horizontal: true,
            },
            FieldDef {
                label: "View present?",
                form_key: "view_present",
                column: "ViewPresent",
                options: &["Frontal", "Lateral", "Other"],
                horizontal: true,
            },
        ],
    )
});

/// The schema for a role.
#[inline]
#[must_use]
pub fn schema_for(role: UserRole) -> &'static FormSchema {
    match role {
        UserRole::Clinician => &CLINICIAN,
        UserRole::DataScientist => &DATA_SCIENTIST,
    }
}
