use cxr_session::{
    Cursor, Direction, ImageCatalog, ImageRef, MoveOutcome, NavCategory, NavRejection,
    SessionConfig, SessionContext, UserRole,
};

use std::time::Duration;
use tempfile::tempdir;

fn flat_catalog(count: usize) -> ImageCatalog {
    ImageCatalog::new(
        (0..count)
            .map(|i| ImageRef {
                study_key: format!("S{i}"),
                image_id: format!("img{i}"),
                image_path: format!("/data/S{i}/img{i}.dcm"),
            })
            .collect(),
    )
}

fn fast_config() -> SessionConfig {
    SessionConfig::new().with_min_nav_interval(Duration::ZERO)
}

fn fill_ds(session: &mut SessionContext) {
    let keys: Vec<(&'static str, String)> = session
        .schema()
        .fields()
        .iter()
        .map(|f| (f.form_key, f.options[0].to_string()))
        .collect();
    for (key, option) in keys {
        session.edit_field(key, Some(option)).unwrap();
    }
}

#[test]
fn test_ds_walks_the_whole_list_and_fills_the_store() {
    let dir = tempdir().unwrap();
    let mut session = SessionContext::with_config(
        dir.path(),
        "carol",
        UserRole::DataScientist,
        flat_catalog(3),
        fast_config(),
    );

    for expected in 1..3 {
        fill_ds(&mut session);
        assert!(session
            .move_cursor(NavCategory::Image, Direction::Next)
            .is_moved());
        assert_eq!(session.cursor(), Cursor::DataScientist { image: expected });
    }
    fill_ds(&mut session);
    // Walking off the end is a silent no-op; the last image still needs an
    // explicit save trigger, which the boundary move does not provide.
    assert_eq!(
        session.move_cursor(NavCategory::Image, Direction::Next),
        MoveOutcome::Rejected(NavRejection::AtBoundary)
    );

    // Every image visited through a move got its record persisted.
    let snapshot = session.store().snapshot();
    assert!(snapshot.most_recent("/data/S0/img0.dcm", "carol").is_some());
    assert!(snapshot.most_recent("/data/S1/img1.dcm", "carol").is_some());
    // The last one was only saved by the field-edit autosave.
    assert!(snapshot.most_recent("/data/S2/img2.dcm", "carol").is_some());
}

#[test]
fn test_any_single_unset_field_blocks_the_move() {
    let dir = tempdir().unwrap();
    let mut session = SessionContext::with_config(
        dir.path(),
        "carol",
        UserRole::DataScientist,
        flat_catalog(2),
        fast_config(),
    );

    fill_ds(&mut session);
    session.edit_field("foreign_bodies", None).unwrap();

    assert_eq!(
        session.move_cursor(NavCategory::Image, Direction::Next),
        MoveOutcome::Rejected(NavRejection::IncompleteForm)
    );
    assert_eq!(session.cursor(), Cursor::DataScientist { image: 0 });
    assert!(session.take_feedback().incomplete_warning);
}

#[test]
fn test_back_navigation_restores_previous_answers() {
    let dir = tempdir().unwrap();
    let mut session = SessionContext::with_config(
        dir.path(),
        "carol",
        UserRole::DataScientist,
        flat_catalog(2),
        fast_config(),
    );

    fill_ds(&mut session);
    session
        .edit_field("intubated", Some("No".to_string()))
        .unwrap();
    assert!(session
        .move_cursor(NavCategory::Image, Direction::Next)
        .is_moved());
    assert!(!session.form().any_set());

    fill_ds(&mut session);
    assert!(session
        .move_cursor(NavCategory::Image, Direction::Prev)
        .is_moved());
    assert_eq!(session.form().get("intubated"), Some("No"));
}

#[test]
fn test_debounced_move_does_not_save() {
    let dir = tempdir().unwrap();
    let mut session = SessionContext::with_config(
        dir.path(),
        "carol",
        UserRole::DataScientist,
        flat_catalog(3),
        SessionConfig::new(), // default 1s debounce
    );

    fill_ds(&mut session);
    assert!(session
        .move_cursor(NavCategory::Image, Direction::Next)
        .is_moved());
    let rows_after_first = session.store().snapshot().len();

    // Double-click: the second request is swallowed whole.
    assert_eq!(
        session.move_cursor(NavCategory::Image, Direction::Next),
        MoveOutcome::Rejected(NavRejection::Debounced)
    );
    assert_eq!(session.cursor(), Cursor::DataScientist { image: 1 });
    assert_eq!(session.store().snapshot().len(), rows_after_first);
}

#[test]
fn test_empty_catalog_moves_are_rejected() {
    let dir = tempdir().unwrap();
    let mut session = SessionContext::with_config(
        dir.path(),
        "carol",
        UserRole::DataScientist,
        flat_catalog(0),
        fast_config(),
    );

    assert!(session.current_image().is_none());
    // Nothing to display means nothing to complete; the guard fires first.
    assert_eq!(
        session.move_cursor(NavCategory::Image, Direction::Next),
        MoveOutcome::Rejected(NavRejection::IncompleteForm)
    );
}
