//! Navigation cursor and state machine pieces
//!
//! The cursor tracks the reviewer's position: (study, view) for the
//! Clinician, a flat image index for the Data Scientist. Each navigation
//! category (study, view, image) carries its own debounce timestamp and
//! its own Idle/Saving state; the transition sequence itself runs in
//! [`crate::session::SessionContext::move_cursor`].

use crate::catalog::ImageCatalog;
use cxr_store::UserRole;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Navigation category. Study and view moves belong to the Clinician,
/// image moves to the Data Scientist; the categories debounce
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum NavCategory {
    Study,
    View,
    Image,
}

impl NavCategory {
    /// Whether a role navigates in this category.
    #[inline]
    #[must_use]
    pub fn applies_to(&self, role: UserRole) -> bool {
        match self {
            NavCategory::Study | NavCategory::View => role == UserRole::Clinician,
            NavCategory::Image => role == UserRole::DataScientist,
        }
    }
}

/// Direction of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Prev,
    Next,
}

impl Direction {
    /// Apply to an index, `None` when it would leave `[0, count)`.
    #[must_use]
    pub(crate) fn step(&self, index: usize, count: usize) -> Option<usize> {
        match self {
            Direction::Prev => index.checked_sub(1),
            Direction::Next => {
                let next = index + 1;
                (next < count).then_some(next)
            }
        }
    }
}

/// Role-dependent position in the assignment. Serializable so the
/// presentation layer can persist and restore a reviewer's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Cursor {
    /// (study index, view index within that study).
    Clinician { study: usize, view: usize },
    /// Flat index into the full image list.
    DataScientist { image: usize },
}

impl Cursor {
    /// Starting position for a role.
    #[inline]
    #[must_use]
    pub fn origin(role: UserRole) -> Self {
        match role {
            UserRole::Clinician => Cursor::Clinician { study: 0, view: 0 },
            UserRole::DataScientist => Cursor::DataScientist { image: 0 },
        }
    }

    /// Clamp out-of-range indices to 0, per the load invariant.
    #[must_use]
    pub fn clamped(self, catalog: &ImageCatalog) -> Self {
        match self {
            Cursor::Clinician { study, view } => {
                let study = if study < catalog.study_count() { study } else { 0 };
                let view = if view < catalog.view_count(study) { view } else { 0 };
                Cursor::Clinician { study, view }
            }
            Cursor::DataScientist { image } => Cursor::DataScientist {
                image: if image < catalog.image_count() { image } else { 0 },
            },
        }
    }

    /// Position after a move in a category, `None` at the boundary.
    #[must_use]
    pub(crate) fn target(
        self,
        category: NavCategory,
        direction: Direction,
        catalog: &ImageCatalog,
    ) -> Option<Cursor> {
        match (self, category) {
            (Cursor::Clinician { study, .. }, NavCategory::Study) => {
                let study = direction.step(study, catalog.study_count())?;
                // View index restarts with the new study.
                Some(Cursor::Clinician { study, view: 0 })
            }
            (Cursor::Clinician { study, view }, NavCategory::View) => {
                let view = direction.step(view, catalog.view_count(study))?;
                Some(Cursor::Clinician { study, view })
            }
            (Cursor::DataScientist { image }, NavCategory::Image) => {
                let image = direction.step(image, catalog.image_count())?;
                Some(Cursor::DataScientist { image })
            }
            _ => None,
        }
    }
}

/// Why a navigation request did not move the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavRejection {
    /// This category does not exist for the session's role.
    UnsupportedCategory,
    /// Another move in this category landed within the minimum interval.
    Debounced,
    /// A save for this category is already in flight.
    SaveInFlight,
    /// The form has unset fields; the incomplete warning was raised.
    IncompleteForm,
    /// The move would leave the valid index range. Silent.
    AtBoundary,
    /// Metadata for the current image is unresolved.
    MetadataUnresolved,
    /// The pre-move save exhausted its retries; re-trigger to retry.
    SaveFailed,
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Cursor advanced; the form now shows the new position.
    Moved,
    /// Cursor unchanged.
    Rejected(NavRejection),
}

impl MoveOutcome {
    /// Whether the cursor advanced.
    #[inline]
    #[must_use]
    pub fn is_moved(&self) -> bool {
        matches!(self, MoveOutcome::Moved)
    }
}

/// Per-category debounce of rapid repeated navigation.
///
/// Every attempt stamps its category, including rejected ones, so holding
/// a key down cannot slip a second move through.
#[derive(Debug)]
pub(crate) struct NavThrottle {
    min_interval: Duration,
    last: HashMap<NavCategory, Instant>,
}

impl NavThrottle {
    pub(crate) fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: HashMap::new(),
        }
    }

    /// Record an attempt; true when it landed within the minimum interval
    /// of the previous attempt in the same category.
    pub(crate) fn too_soon(&mut self, category: NavCategory) -> bool {
        let now = Instant::now();
        self.last
            .insert(category, now)
            .is_some_and(|prev| now.duration_since(prev) < self.min_interval)
    }
}

/// Idle/Saving state per navigation category.
#[derive(Debug, Default)]
pub(crate) struct SaveFlags {
    saving: HashMap<NavCategory, bool>,
}

impl SaveFlags {
    pub(crate) fn in_flight(&self, category: NavCategory) -> bool {
        self.saving.get(&category).copied().unwrap_or(false)
    }

    pub(crate) fn set(&mut self, category: NavCategory, saving: bool) {
        self.saving.insert(category, saving);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ImageRef;

    fn catalog() -> ImageCatalog {
        ImageCatalog::new(vec![
            ImageRef {
                study_key: "S1".to_string(),
                image_id: "a".to_string(),
                image_path: "/d/S1/a.dcm".to_string(),
            },
            ImageRef {
                study_key: "S1".to_string(),
                image_id: "b".to_string(),
                image_path: "/d/S1/b.dcm".to_string(),
            },
            ImageRef {
                study_key: "S2".to_string(),
                image_id: "c".to_string(),
                image_path: "/d/S2/c.dcm".to_string(),
            },
        ])
    }

    #[test]
    fn study_move_resets_view() {
        let catalog = catalog();
        let cursor = Cursor::Clinician { study: 0, view: 1 };
        let target = cursor
            .target(NavCategory::Study, Direction::Next, &catalog)
            .unwrap();
        assert_eq!(target, Cursor::Clinician { study: 1, view: 0 });
    }

    #[test]
    fn moves_stop_at_boundaries() {
        let catalog = catalog();
        let origin = Cursor::origin(UserRole::Clinician);
        assert!(origin
            .target(NavCategory::Study, Direction::Prev, &catalog)
            .is_none());
        assert!(origin
            .target(NavCategory::View, Direction::Prev, &catalog)
            .is_none());

        let last_study = Cursor::Clinician { study: 1, view: 0 };
        assert!(last_study
            .target(NavCategory::Study, Direction::Next, &catalog)
            .is_none());
        // S2 has a single view.
        assert!(last_study
            .target(NavCategory::View, Direction::Next, &catalog)
            .is_none());

        let last_image = Cursor::DataScientist { image: 2 };
        assert!(last_image
            .target(NavCategory::Image, Direction::Next, &catalog)
            .is_none());
    }

    #[test]
    fn category_role_pairing() {
        assert!(NavCategory::Study.applies_to(UserRole::Clinician));
        assert!(NavCategory::View.applies_to(UserRole::Clinician));
        assert!(!NavCategory::Image.applies_to(UserRole::Clinician));
        assert!(NavCategory::Image.applies_to(UserRole::DataScientist));
    }

    #[test]
    fn mismatched_category_has_no_target() {
        let catalog = catalog();
        let ds = Cursor::DataScientist { image: 0 };
        assert!(ds.target(NavCategory::Study, Direction::Next, &catalog).is_none());
    }

    #[test]
    fn out_of_range_cursor_clamps_to_zero() {
        let catalog = catalog();
        let cursor = Cursor::Clinician { study: 9, view: 4 }.clamped(&catalog);
        assert_eq!(cursor, Cursor::Clinician { study: 0, view: 0 });

        let cursor = Cursor::DataScientist { image: 99 }.clamped(&catalog);
        assert_eq!(cursor, Cursor::DataScientist { image: 0 });

        let kept = Cursor::Clinician { study: 1, view: 0 }.clamped(&catalog);
        assert_eq!(kept, Cursor::Clinician { study: 1, view: 0 });
    }

    #[test]
    fn throttle_is_per_category() {
        let mut throttle = NavThrottle::new(Duration::from_secs(60));
        assert!(!throttle.too_soon(NavCategory::Study));
        assert!(throttle.too_soon(NavCategory::Study));
        // A view move right after a study move is allowed.
        assert!(!throttle.too_soon(NavCategory::View));
    }

    #[test]
    fn zero_interval_never_debounces() {
        let mut throttle = NavThrottle::new(Duration::ZERO);
        assert!(!throttle.too_soon(NavCategory::Image));
        assert!(!throttle.too_soon(NavCategory::Image));
    }

    #[test]
    fn rejected_attempts_still_stamp_the_clock() {
        let mut throttle = NavThrottle::new(Duration::from_secs(60));
        assert!(!throttle.too_soon(NavCategory::Image));
        // Both of these are rejections, and each pushes the window out.
        assert!(throttle.too_soon(NavCategory::Image));
        assert!(throttle.too_soon(NavCategory::Image));
    }
}
