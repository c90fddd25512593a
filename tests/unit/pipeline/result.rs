use super::*;

#[test]
fn json_shape_is_stable() {
    let result = SnapshotResult {
        success: false,
        output_path: Some(PathBuf::from("/config/snapshots/a.jpg")),
        backup_path: Some(PathBuf::from("/config/backups/a.jpg")),
        original_resolution: Some(Resolution::new(640, 480)),
        final_resolution: Some(Resolution::new(320, 240)),
        error: Some(ResultError::from_error(
            &SnapError::backup_failed("disk full"),
            Stage::Backup,
        )),
        warnings: vec!["font fallback".to_owned()],
    };
    let v = serde_json::to_value(&result).unwrap();
    assert_eq!(v["success"], false);
    assert_eq!(v["final_resolution"]["width"], 320);
    assert_eq!(v["error"]["kind"], "backup_failed");
    assert_eq!(v["error"]["stage"], "backup");
    assert_eq!(v["error"]["message"], "backup failed: disk full");
    assert_eq!(v["warnings"][0], "font fallback");
}

#[test]
fn summary_names_the_failed_stage() {
    let ok = SnapshotResult {
        success: true,
        output_path: Some(PathBuf::from("out.jpg")),
        ..SnapshotResult::default()
    };
    assert_eq!(ok.summary(), "ok: out.jpg");

    let failed = SnapshotResult {
        error: Some(ResultError {
            kind: ErrorKind::SourceUnavailable,
            message: "offline".to_owned(),
            stage: Stage::Fetching,
        }),
        ..SnapshotResult::default()
    };
    assert_eq!(failed.summary(), "failed at Fetching: offline");
}
