//! Annotation loader
//!
//! Pulls the most recent persisted record for an image back into form
//! state when the cursor lands on it. No match leaves the form all-null
//! (it is reset first either way).

use crate::form::FormState;
use cxr_store::StoreSnapshot;

/// Reset the form, then populate it from the most recent record matching
/// (`image_path`, `username`) in the snapshot, if any.
pub fn load_annotations_for_image(
    snapshot: &StoreSnapshot,
    image_path: &str,
    username: &str,
    form: &mut FormState,
) {
    form.reset();
    if let Some(record) = snapshot.most_recent(image_path, username) {
        tracing::debug!(image_path, username, "restoring persisted annotations");
        form.load(record);
    }
}
