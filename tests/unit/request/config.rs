use super::*;

#[test]
fn missing_fields_take_defaults() {
    let cfg = SnapshotConfig::from_reader(r#"{ "max_video_duration_secs": 10 }"#.as_bytes())
        .unwrap();
    assert_eq!(cfg.max_video_duration_secs, 10);
    assert_eq!(cfg.default_bar_height_px, 40);
    assert_eq!(cfg.snapshot_folder, PathBuf::from("/config/snapshots"));
    assert_eq!(cfg.rotate_fill_color, "black");
}

#[test]
fn validation_rejects_zero_ceilings() {
    let err = SnapshotConfig::from_reader(r#"{ "encode_timeout_secs": 0 }"#.as_bytes())
        .unwrap_err();
    assert!(err.to_string().contains("encode_timeout_secs"));

    let err = SnapshotConfig::from_reader(r#"{ "jpeg_quality": 0 }"#.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("jpeg_quality"));
}

#[test]
fn duration_is_clamped_to_ceiling() {
    let cfg = SnapshotConfig::default();
    assert_eq!(cfg.clamp_duration(5), 5);
    assert_eq!(cfg.clamp_duration(300), 40);
    assert_eq!(cfg.clamp_duration(0), 1);
}

#[test]
fn relative_paths_join_their_folder() {
    let cfg = SnapshotConfig {
        snapshot_folder: PathBuf::from("/data/snaps"),
        backup_folder: PathBuf::from("/data/backup"),
        font_folder: PathBuf::from("/data/fonts"),
        ..SnapshotConfig::default()
    };
    assert_eq!(
        cfg.resolve_destination(Path::new("front.jpg")),
        PathBuf::from("/data/snaps/front.jpg")
    );
    assert_eq!(
        cfg.resolve_backup(Path::new("front.jpg")),
        PathBuf::from("/data/backup/front.jpg")
    );
    assert_eq!(
        cfg.resolve_font(Path::new("Arial.ttf")),
        PathBuf::from("/data/fonts/Arial.ttf")
    );
    assert_eq!(
        cfg.resolve_destination(Path::new("/tmp/abs.png")),
        PathBuf::from("/tmp/abs.png")
    );
}

#[test]
fn from_path_reports_missing_file() {
    let err = SnapshotConfig::from_path("target/does-not-exist/config.json").unwrap_err();
    assert!(err.to_string().contains("open snapshot config"));
}
