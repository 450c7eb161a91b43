//! The annotation session context
//!
//! One [`SessionContext`] per logged-in reviewer: it owns the cursor, the
//! form, the per-day record store, the debounce/save-in-flight state and
//! the feedback flags, and runs the save-before-move transition sequence.
//! Everything the presentation layer reads or triggers goes through this
//! struct; there is no ambient state.

use crate::catalog::{ImageCatalog, ImageRef, MetadataProvider};
use crate::error::{MetadataError, SessionError};
use crate::form::FormState;
use crate::loader::load_annotations_for_image;
use crate::navigation::{Cursor, Direction, MoveOutcome, NavCategory, NavRejection, NavThrottle, SaveFlags};
use crate::save::{build_records, elapsed_seconds, SaveScope};
use crate::schema::{schema_for, FormSchema};
use crate::window::WindowState;
use chrono::{DateTime, Utc};
use cxr_store::{RecordStore, RetryPolicy, StoreError, UserRole};
use std::path::Path;
use std::time::Duration;

/// Session tuning knobs.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Minimum interval between moves in the same navigation category.
    pub min_nav_interval: Duration,
    /// Retry schedule for the record store.
    pub retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_nav_interval: Duration::from_secs(1),
            retry: RetryPolicy::default(),
        }
    }
}

impl SessionConfig {
    /// Default configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a navigation debounce interval.
    #[inline]
    #[must_use]
    pub fn with_min_nav_interval(mut self, interval: Duration) -> Self {
        self.min_nav_interval = interval;
        self
    }

    /// With a store retry schedule.
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// User-facing flags for the presentation layer, with take-semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct SessionFeedback {
    /// The reviewer tried to navigate with unset fields.
    pub incomplete_warning: bool,
    /// The last save landed.
    pub saved: bool,
    /// The last save gave up after retries; message for display.
    pub save_failed: Option<String>,
}

/// State of one reviewer's annotation session.
pub struct SessionContext {
    username: String,
    role: UserRole,
    schema: &'static FormSchema,
    catalog: ImageCatalog,
    store: RecordStore,
    form: FormState,
    cursor: Cursor,
    throttle: NavThrottle,
    save_flags: SaveFlags,
    annotation_start: Option<DateTime<Utc>>,
    window: Option<WindowState>,
    metadata_blocked: bool,
    feedback: SessionFeedback,
}

impl SessionContext {
    /// Start a session with default configuration.
    #[must_use]
    pub fn new(
        annotation_dir: &Path,
        username: impl Into<String>,
        role: UserRole,
        catalog: ImageCatalog,
    ) -> Self {
        Self::with_config(annotation_dir, username, role, catalog, SessionConfig::default())
    }

    /// Start a session. Opens (or lazily creates) today's store file for
    /// the user and role, positions the cursor at the start of the
    /// assignment, and restores any persisted annotations for that image.
    #[must_use]
    pub fn with_config(
        annotation_dir: &Path,
        username: impl Into<String>,
        role: UserRole,
        catalog: ImageCatalog,
        config: SessionConfig,
    ) -> Self {
        let username = username.into();
        let store = RecordStore::open_with_retry(
            annotation_dir,
            &username,
            role,
            Utc::now().date_naive(),
            config.retry,
        );
        let schema = schema_for(role);
        let mut session = Self {
            username,
            role,
            schema,
            catalog,
            store,
            form: FormState::new(schema),
            cursor: Cursor::origin(role),
            throttle: NavThrottle::new(config.min_nav_interval),
            save_flags: SaveFlags::default(),
            annotation_start: None,
            window: None,
            metadata_blocked: false,
            feedback: SessionFeedback::default(),
        };
        session.load_current();
        session.annotation_start = Some(Utc::now());
        session
    }

    /// Reviewer username.
    #[inline]
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Reviewer role.
    #[inline]
    #[must_use]
    pub fn role(&self) -> UserRole {
        self.role
    }

    /// The role's field schema.
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &'static FormSchema {
        self.schema
    }

    /// Assigned images.
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &ImageCatalog {
        &self.catalog
    }

    /// Current position.
    #[inline]
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Form state for the displayed image.
    #[inline]
    #[must_use]
    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// Record store backing this session.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Window state, once resolved for the displayed image.
    #[inline]
    #[must_use]
    pub fn window(&self) -> Option<&WindowState> {
        self.window.as_ref()
    }

    /// Whether every schema field is set. Gates navigation.
    #[inline]
    #[must_use]
    pub fn form_complete(&self) -> bool {
        self.form.is_complete()
    }

    /// Image at the cursor, if the assignment is non-empty.
    #[must_use]
    pub fn current_image(&self) -> Option<&ImageRef> {
        match self.cursor {
            Cursor::Clinician { study, view } => self.catalog.view(study, view),
            Cursor::DataScientist { image } => self.catalog.image(image),
        }
    }

    /// Jump to a saved position, clamping out-of-range indices to 0, and
    /// restore that image's annotations.
    pub fn resume_at(&mut self, cursor: Cursor) {
        self.cursor = cursor.clamped(&self.catalog);
        self.load_current();
        self.annotation_start = Some(Utc::now());
    }

    /// Apply a field-edit event from the presentation layer.
    ///
    /// A valid edit is stored and immediately persisted (partial save, so
    /// in-progress work survives an unexpected exit); a store failure is
    /// reported through feedback, never as an error. An invalid option is
    /// rejected without mutating the form.
    pub fn edit_field(
        &mut self,
        form_key: &str,
        value: Option<String>,
    ) -> Result<(), SessionError> {
        self.form.set(form_key, value)?;
        if let Err(err) = self.persist_current() {
            self.feedback.save_failed = Some(err.to_string());
        }
        Ok(())
    }

    /// Run one navigation transition.
    ///
    /// Sequence: save-in-flight and debounce checks, completeness guard,
    /// bounds check, save of the current position, cursor advance, reload
    /// of the new position's annotations, elapsed-time reset. Any
    /// rejection leaves the cursor and form untouched; a store failure
    /// also leaves them untouched so the reviewer can simply re-trigger
    /// the move.
    pub fn move_cursor(&mut self, category: NavCategory, direction: Direction) -> MoveOutcome {
        if !category.applies_to(self.role) {
            return MoveOutcome::Rejected(NavRejection::UnsupportedCategory);
        }
        if self.save_flags.in_flight(category) {
            return MoveOutcome::Rejected(NavRejection::SaveInFlight);
        }
        if self.throttle.too_soon(category) {
            return MoveOutcome::Rejected(NavRejection::Debounced);
        }
        if self.metadata_blocked {
            return MoveOutcome::Rejected(NavRejection::MetadataUnresolved);
        }
        if !self.form.is_complete() {
            self.feedback.incomplete_warning = true;
            return MoveOutcome::Rejected(NavRejection::IncompleteForm);
        }
        let Some(target) = self.cursor.target(category, direction, &self.catalog) else {
            return MoveOutcome::Rejected(NavRejection::AtBoundary);
        };

        self.save_flags.set(category, true);
        let saved = self.persist_current();
        match saved {
            Err(err) => {
                self.feedback.save_failed = Some(err.to_string());
                self.save_flags.set(category, false);
                MoveOutcome::Rejected(NavRejection::SaveFailed)
            }
            Ok(()) => {
                tracing::debug!(?category, ?direction, from = ?self.cursor, to = ?target, "cursor advanced");
                self.cursor = target;
                self.load_current();
                self.annotation_start = Some(Utc::now());
                self.metadata_blocked = false;
                self.save_flags.set(category, false);
                MoveOutcome::Moved
            }
        }
    }

    /// Resolve window state for the displayed image through the external
    /// metadata provider, re-initializing when the image changed.
    ///
    /// On failure the session records the image as unresolved; navigation
    /// and save are suspended until a later resolve succeeds.
    pub fn resolve_window(
        &mut self,
        provider: &dyn MetadataProvider,
    ) -> Result<&WindowState, MetadataError> {
        let image_path = match self.current_image() {
            Some(image) => image.image_path.clone(),
            None => {
                return Err(MetadataError::Unresolved {
                    path: String::new(),
                    reason: "no image at cursor".to_string(),
                })
            }
        };

        let window = match self.window.take().filter(|w| w.is_for(&image_path)) {
            Some(window) => window,
            None => {
                let meta = provider.metadata(&image_path).map_err(|err| {
                    tracing::warn!(image_path = %image_path, error = %err, "image metadata unresolved");
                    self.metadata_blocked = true;
                    err
                })?;
                WindowState::from_metadata(&image_path, &meta)
            }
        };
        self.metadata_blocked = false;
        Ok(self.window.insert(window))
    }

    /// Pending user-facing flags; reading clears them.
    pub fn take_feedback(&mut self) -> SessionFeedback {
        std::mem::take(&mut self.feedback)
    }

    /// Persist the current position's form: one record per view of the
    /// current study for a Clinician, one record for the displayed image
    /// for a Data Scientist.
    fn persist_current(&mut self) -> Result<(), StoreError> {
        let Some(image) = self.current_image() else {
            return Ok(());
        };
        let targets: Vec<&ImageRef> = match SaveScope::for_role(self.role) {
            SaveScope::SingleImage => vec![image],
            SaveScope::AllViewsInStudy => self.catalog.views_of(&image.study_key),
        };
        let records = build_records(
            &self.form,
            &targets,
            &self.username,
            self.role,
            elapsed_seconds(self.annotation_start),
        );
        self.store.upsert(records)?;
        self.feedback.saved = true;
        Ok(())
    }

    /// Reset the form and restore the cursor image's persisted
    /// annotations, if any.
    fn load_current(&mut self) {
        self.form.reset();
        let image_path = match self.current_image() {
            Some(image) => image.image_path.clone(),
            None => return,
        };
        load_annotations_for_image(
            self.store.snapshot(),
            &image_path,
            &self.username,
            &mut self.form,
        );
    }
}
