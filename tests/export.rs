//! Export service tests: file names, TSV report, ZIP archive.

mod common;

use std::{fs, io::Read};

use scenecut::{ExportError, ExportService, Scene, TSV_HEADER, TsvRecord};

use common::{analysis, scene};

fn analyzed_scenes() -> Vec<Scene> {
    let mut scenes = vec![scene(1, 0.0), scene(2, 61.5), scene(3, 125.0)];
    scenes[0].analysis = Some(analysis("A sunny beach", &["beach", "sun"]));
    scenes[2].analysis = Some(analysis("Sunset over the pier", &["pier"]));
    scenes
}

// ── File names ─────────────────────────────────────────────────────

#[test]
fn scene_file_name_uses_number_and_timestamp() {
    assert_eq!(ExportService::scene_file_name(&scene(1, 0.0)), "scene_1_00-00.jpg");
    assert_eq!(ExportService::scene_file_name(&scene(42, 605.9)), "scene_42_10-05.jpg");
}

#[test]
fn tsv_file_name_uses_base_name() {
    assert_eq!(ExportService::tsv_file_name("holiday"), "holiday_scenes.tsv");
}

// ── TSV report ─────────────────────────────────────────────────────

#[test]
fn report_starts_with_bom_and_header() {
    let report = ExportService::new().tsv_report(&analyzed_scenes());

    assert!(report.starts_with('\u{feff}'));
    let mut lines = report.trim_start_matches('\u{feff}').split('\n');
    assert_eq!(lines.next(), Some("sceneNumber\ttimestampFormatted\tdescription\ttags"));
    assert_eq!(lines.next(), Some("1\t00:00\tA sunny beach\tbeach, sun"));
    assert_eq!(lines.next(), Some("2\t01:01\t\t"));
    assert_eq!(lines.next(), Some("3\t02:05\tSunset over the pier\tpier"));
    assert_eq!(lines.next(), None);
}

#[test]
fn report_round_trips_through_parser() {
    let scenes = analyzed_scenes();
    let report = ExportService::new().tsv_report(&scenes);

    let parsed = ExportService::parse_tsv(&report).unwrap();
    let expected: Vec<TsvRecord> = scenes.iter().map(TsvRecord::from_scene).collect();
    assert_eq!(parsed, expected);

    assert_eq!(parsed[1].description, "");
    assert!(parsed[1].tags.is_empty());
}

#[test]
fn report_keeps_one_line_per_scene() {
    let mut scenes = vec![scene(1, 0.0)];
    scenes[0].analysis = Some(analysis("line one\nline\ttwo", &["a\tb"]));

    let report = ExportService::new().tsv_report(&scenes);
    let parsed = ExportService::parse_tsv(&report).unwrap();

    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].description, "line one line two");
    assert_eq!(parsed[0].tags, vec!["a b"]);
}

#[test]
fn parser_rejects_malformed_reports() {
    assert!(matches!(
        ExportService::parse_tsv("not a report"),
        Err(ExportError::MalformedReport { line: 1, .. })
    ));

    let missing_field = format!("{TSV_HEADER}\n1\t00:00\tonly three");
    assert!(matches!(
        ExportService::parse_tsv(&missing_field),
        Err(ExportError::MalformedReport { line: 2, .. })
    ));

    let bad_number = format!("{TSV_HEADER}\nfirst\t00:00\t\t");
    assert!(matches!(
        ExportService::parse_tsv(&bad_number),
        Err(ExportError::MalformedReport { line: 2, .. })
    ));
}

#[test]
fn export_tsv_writes_named_file() {
    let directory = tempfile::tempdir().unwrap();
    let scenes = analyzed_scenes();

    let path = ExportService::new()
        .export_tsv(&scenes, directory.path(), "holiday")
        .unwrap();

    assert_eq!(path, directory.path().join("holiday_scenes.tsv"));
    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(written, ExportService::new().tsv_report(&scenes));
}

// ── Scene files ────────────────────────────────────────────────────

#[test]
fn export_single_writes_thumbnail_bytes() {
    let directory = tempfile::tempdir().unwrap();
    let scene = scene(7, 88.5);

    let path = ExportService::new().export_single(&scene, directory.path()).unwrap();

    assert_eq!(path.file_name().unwrap(), "scene_7_01-28.jpg");
    assert_eq!(fs::read(&path).unwrap(), scene.thumbnail.data);
}

#[test]
fn export_directory_writes_every_scene_without_leftovers() {
    let directory = tempfile::tempdir().unwrap();
    let target = directory.path().join("scenes");
    let scenes = analyzed_scenes();

    let paths = ExportService::new().export_directory(&scenes, &target).unwrap();

    assert_eq!(paths.len(), 3);
    let mut names: Vec<String> = fs::read_dir(&target)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec!["scene_1_00-00.jpg", "scene_2_01-01.jpg", "scene_3_02-05.jpg"]
    );
}

// ── Archive ────────────────────────────────────────────────────────

#[test]
fn archive_contains_selected_scenes_in_order() {
    let directory = tempfile::tempdir().unwrap();
    let archive_path = directory.path().join("holiday_scenes.zip");
    let scenes = analyzed_scenes();
    let selected = [&scenes[2], &scenes[0]];

    ExportService::new()
        .export_archive(selected, &archive_path)
        .unwrap();

    let mut archive = zip::ZipArchive::new(fs::File::open(&archive_path).unwrap()).unwrap();
    assert_eq!(archive.len(), 2);

    let mut first = archive.by_index(0).unwrap();
    assert_eq!(first.name(), "scene_3_02-05.jpg");
    let mut bytes = Vec::new();
    first.read_to_end(&mut bytes).unwrap();
    assert_eq!(bytes, scenes[2].thumbnail.data);
    drop(first);

    assert_eq!(archive.by_index(1).unwrap().name(), "scene_1_00-00.jpg");
}

#[test]
fn exporting_nothing_is_an_error() {
    let directory = tempfile::tempdir().unwrap();
    let export = ExportService::new();
    let none: Vec<Scene> = Vec::new();

    assert!(matches!(
        export.export_archive(&none, directory.path().join("empty.zip")),
        Err(ExportError::NothingToExport)
    ));
    assert!(matches!(
        export.export_tsv(&none, directory.path(), "empty"),
        Err(ExportError::NothingToExport)
    ));
    assert!(matches!(
        export.export_directory(&none, directory.path()),
        Err(ExportError::NothingToExport)
    ));
    assert_eq!(fs::read_dir(directory.path()).unwrap().count(), 0);
}
