//! Scene catalog tests.

mod common;

use scenecut::{SceneCatalog, SceneStatus, format_timestamp};

use common::{analysis, scene};

fn catalog(count: u32) -> SceneCatalog {
    SceneCatalog::new((1..=count).map(|n| scene(n, f64::from(n - 1) * 1.5)).collect())
}

// ── Selection ──────────────────────────────────────────────────────

#[test]
fn select_and_deselect_all() {
    let mut catalog = catalog(4);
    assert_eq!(catalog.selected_count(), 0);

    catalog.select_all();
    assert_eq!(catalog.selected_count(), 4);
    assert!(catalog.iter().all(|scene| scene.is_selected));

    catalog.deselect_all();
    assert!(catalog.selected().is_empty());
}

#[test]
fn toggle_selection_is_its_own_inverse() {
    let mut catalog = catalog(3);
    let id = catalog.scenes()[1].id;

    assert!(catalog.toggle_selection(&id));
    assert!(catalog.get(&id).unwrap().is_selected);
    assert_eq!(catalog.selected_count(), 1);

    assert!(catalog.toggle_selection(&id));
    assert!(!catalog.get(&id).unwrap().is_selected);
    assert_eq!(catalog.selected_count(), 0);
}

#[test]
fn toggle_selection_touches_only_one_scene() {
    let mut catalog = catalog(3);
    catalog.select_all();
    let id = catalog.scenes()[0].id;

    catalog.toggle_selection(&id);

    let flags: Vec<bool> = catalog.iter().map(|scene| scene.is_selected).collect();
    assert_eq!(flags, vec![false, true, true]);
}

#[test]
fn unknown_ids_are_ignored() {
    let mut catalog = catalog(3);
    let stale = scene(1, 0.0).id;
    let before = catalog.clone();

    assert!(!catalog.toggle_selection(&stale));
    assert!(!catalog.apply_analysis(&stale, analysis("ghost", &[])));
    assert!(!catalog.mark_error(&stale));
    assert!(catalog.get(&stale).is_none());
    assert_eq!(catalog, before);
}

#[test]
fn selected_keeps_catalog_order() {
    let mut catalog = catalog(5);
    let ids: Vec<_> = catalog.iter().map(|scene| scene.id).collect();
    catalog.toggle_selection(&ids[4]);
    catalog.toggle_selection(&ids[1]);

    let numbers: Vec<u32> = catalog.selected().iter().map(|scene| scene.scene_number).collect();
    assert_eq!(numbers, vec![2, 5]);
}

// ── Analysis state ─────────────────────────────────────────────────

#[test]
fn apply_analysis_updates_only_the_matching_scene() {
    let mut catalog = catalog(3);
    let id = catalog.scenes()[2].id;

    assert!(catalog.apply_analysis(&id, analysis("a beach", &["sea", "sand"])));

    let updated = catalog.get(&id).unwrap();
    assert_eq!(updated.analysis_status, SceneStatus::Completed);
    assert_eq!(updated.analysis.as_ref().unwrap().tags, vec!["sea", "sand"]);

    for other in &catalog.scenes()[..2] {
        assert_eq!(other.analysis_status, SceneStatus::Pending);
        assert!(other.analysis.is_none());
    }
    assert_eq!(catalog.completed_count(), 1);
}

#[test]
fn mark_analyzing_uses_position() {
    let mut catalog = catalog(2);

    assert!(catalog.mark_analyzing(1));
    assert_eq!(catalog.scenes()[1].analysis_status, SceneStatus::Analyzing);
    assert_eq!(catalog.scenes()[0].analysis_status, SceneStatus::Pending);

    assert!(!catalog.mark_analyzing(2));
}

#[test]
fn settled_once_every_scene_completed_or_failed() {
    let mut catalog = catalog(2);
    let ids: Vec<_> = catalog.iter().map(|scene| scene.id).collect();
    assert!(!catalog.all_settled());

    catalog.apply_analysis(&ids[0], analysis("ok", &[]));
    assert!(!catalog.all_settled());

    catalog.mark_error(&ids[1]);
    assert!(catalog.all_settled());
    assert_eq!(catalog.completed_count(), 1);
    assert_eq!(catalog.failed_count(), 1);
}

#[test]
fn completed_scene_is_not_downgraded_to_error() {
    let mut catalog = catalog(1);
    let id = catalog.scenes()[0].id;
    catalog.apply_analysis(&id, analysis("ok", &["a"]));

    assert!(!catalog.mark_error(&id));
    assert_eq!(catalog.scenes()[0].analysis_status, SceneStatus::Completed);
    assert_eq!(catalog.failed_count(), 0);
}

// ── Timestamps ─────────────────────────────────────────────────────

#[test]
fn formatted_timestamps_are_minutes_and_seconds() {
    assert_eq!(format_timestamp(0.0), "00:00");
    assert_eq!(format_timestamp(59.99), "00:59");
    assert_eq!(format_timestamp(88.5), "01:28");
    assert_eq!(format_timestamp(3_725.0), "62:05");

    assert_eq!(scene(60, 88.5).timestamp_formatted(), "01:28");
}
