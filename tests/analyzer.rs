//! External analyzer program tests.

#![cfg(unix)]

mod common;

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use scenecut::{
    AnalysisStatus, AnalyzerError, CommandAnalyzer, SceneAnalyzer, SessionController, SessionError,
};

use common::{extract_scenes, thumbnail};

const DESCRIBE_SCRIPT: &str = "#!/bin/sh\ncat > /dev/null\nprintf '{\"description\": \"a beach\", \"tags\": [\"sand\", \"sea\"]}'\n";

fn write_script(directory: &Path, name: &str, body: &str, mode: u32) -> PathBuf {
    let path = directory.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
    path
}

// ── Preparation ────────────────────────────────────────────────────

#[test]
fn missing_program_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = CommandAnalyzer::new(dir.path().join("describe-frame"));

    assert!(matches!(analyzer.prepare(), Err(AnalyzerError::Unavailable(_))));
}

#[test]
fn non_executable_program_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "describe-frame", DESCRIBE_SCRIPT, 0o644);

    let analyzer = CommandAnalyzer::new(script);

    assert!(matches!(analyzer.prepare(), Err(AnalyzerError::Unavailable(_))));
}

#[test]
fn non_executable_program_fails_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "describe-frame", DESCRIBE_SCRIPT, 0o644);
    let mut controller = SessionController::new();
    extract_scenes(&mut controller, 3);

    let result = controller.run_analysis(&CommandAnalyzer::new(script));

    assert!(matches!(result, Err(SessionError::AnalysisFailed { .. })));
    assert_eq!(controller.analysis_status(), AnalysisStatus::Error);
    let catalog = controller.session().unwrap().catalog();
    assert_eq!(catalog.failed_count(), 0);
    assert_eq!(catalog.completed_count(), 0);
}

// ── Analysis ───────────────────────────────────────────────────────

#[test]
fn executable_program_describes_the_frame() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "describe-frame", DESCRIBE_SCRIPT, 0o755);
    let analyzer = CommandAnalyzer::new(script);

    analyzer.prepare().unwrap();
    let analysis = analyzer.analyze(&thumbnail(b"jpeg bytes")).unwrap();

    assert_eq!(analysis.description, "a beach");
    assert_eq!(analysis.tags, vec!["sand".to_string(), "sea".to_string()]);
}

#[test]
fn failing_program_fails_only_that_call() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "describe-frame",
        "#!/bin/sh\ncat > /dev/null\necho 'quota exceeded' >&2\nexit 3\n",
        0o755,
    );
    let analyzer = CommandAnalyzer::new(script);

    match analyzer.analyze(&thumbnail(b"jpeg bytes")) {
        Err(AnalyzerError::Failed(message)) => assert!(message.contains("quota exceeded")),
        other => panic!("Expected Failed, got: {other:?}"),
    }
}

#[test]
fn unparsable_output_is_an_invalid_response() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "describe-frame",
        "#!/bin/sh\ncat > /dev/null\necho 'not json'\n",
        0o755,
    );
    let analyzer = CommandAnalyzer::new(script);

    assert!(matches!(
        analyzer.analyze(&thumbnail(b"jpeg bytes")),
        Err(AnalyzerError::InvalidResponse(_))
    ));
}
