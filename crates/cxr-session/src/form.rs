//! In-memory form state for the currently displayed image
//!
//! One value slot per schema field, reset whenever the displayed image
//! changes and repopulated from the most recent persisted record.

use crate::error::SessionError;
use crate::schema::FormSchema;
use cxr_store::AnnotationRecord;
use indexmap::IndexMap;

/// Form key -> selected option (or unset), in schema order.
#[derive(Debug)]
pub struct FormState {
    schema: &'static FormSchema,
    values: IndexMap<&'static str, Option<String>>,
}

impl FormState {
    /// All-null state for the given schema.
    #[must_use]
    pub fn new(schema: &'static FormSchema) -> Self {
        let values = schema.fields().iter().map(|f| (f.form_key, None)).collect();
        Self { schema, values }
    }

    /// Schema this form is bound to.
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &'static FormSchema {
        self.schema
    }

    /// Set every field back to unset.
    pub fn reset(&mut self) {
        for value in self.values.values_mut() {
            *value = None;
        }
    }

    /// Current selection for a form key.
    #[must_use]
    pub fn get(&self, form_key: &str) -> Option<&str> {
        self.values.get(form_key).and_then(|v| v.as_deref())
    }

    /// Apply a field-edit event.
    ///
    /// `None` clears the field. A non-null value must be one of the
    /// field's allowed options; otherwise the event is rejected and the
    /// form is left untouched.
    pub fn set(&mut self, form_key: &str, value: Option<String>) -> Result<(), SessionError> {
        let field = self
            .schema
            .field(form_key)
            .ok_or_else(|| SessionError::UnknownField(form_key.to_string()))?;
        if let Some(v) = &value {
            if !field.allows(v) {
                return Err(SessionError::InvalidFieldValue {
                    field: form_key.to_string(),
                    value: v.clone(),
                });
            }
        }
        self.values[field.form_key] = value;
        Ok(())
    }

    /// Populate from a persisted record.
    ///
    /// Columns absent or null in the record leave their field unset.
    /// Stored values are taken as-is, without option validation: a value
    /// written under an older schema still counts as present, so stale
    /// records never block navigation.
    pub fn load(&mut self, record: &AnnotationRecord) {
        for field in self.schema.fields() {
            if let Some(Some(value)) = record.fields.get(field.column) {
                self.values[field.form_key] = Some(value.clone());
            }
        }
    }

    /// True iff every schema field is non-null. Gates all navigation.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.values.values().all(Option::is_some)
    }

    /// Whether any field has been set.
    #[must_use]
    pub fn any_set(&self) -> bool {
        self.values.values().any(Option::is_some)
    }

    /// (form key, selection) pairs in schema order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, Option<&str>)> + '_ {
        self.values.iter().map(|(k, v)| (*k, v.as_deref()))
    }
}
