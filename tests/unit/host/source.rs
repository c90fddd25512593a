use super::*;

#[test]
fn scheme_selects_stream_source() {
    assert_eq!(source_from_spec("rtsp://cam/1").describe(), "rtsp://cam/1");
    assert_eq!(source_from_spec("snap.jpg").describe(), "file:snap.jpg");
}

#[test]
fn missing_file_is_source_unavailable() {
    let src = FileSource::new("target/no-such-dir/frame.jpg");
    assert!(matches!(
        src.fetch_still().unwrap_err(),
        SnapError::SourceUnavailable(_)
    ));
    assert!(matches!(
        src.fetch_stream_uri().unwrap_err(),
        SnapError::SourceUnavailable(_)
    ));
}

#[test]
fn existing_file_reads_bytes() {
    let dir = Path::new("target/unit-host-source");
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join("frame.bin");
    std::fs::write(&path, b"abc").unwrap();

    let src = FileSource::new(&path);
    assert_eq!(src.fetch_still().unwrap(), b"abc");
    assert_eq!(src.fetch_stream_uri().unwrap(), path.to_string_lossy());
}

#[test]
fn stream_uri_is_passed_through() {
    let src = StreamSource::new("http://cam.local/video.mjpg");
    assert_eq!(src.fetch_stream_uri().unwrap(), "http://cam.local/video.mjpg");
}
