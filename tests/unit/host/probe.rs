use super::*;

#[test]
fn first_video_stream_wins() {
    let json = br#"{
        "streams": [
            { "codec_type": "audio" },
            { "codec_type": "video", "width": 1920, "height": 1080 },
            { "codec_type": "video", "width": 640, "height": 480 }
        ]
    }"#;
    assert_eq!(parse_probe_json(json).unwrap(), Resolution::new(1920, 1080));
}

#[test]
fn missing_video_stream_is_an_error() {
    assert!(parse_probe_json(br#"{ "streams": [] }"#).is_err());
    assert!(parse_probe_json(br#"{}"#).is_err());
    assert!(parse_probe_json(br#"{ "streams": [{ "codec_type": "video" }] }"#).is_err());
    assert!(parse_probe_json(b"not json").is_err());
}

#[test]
fn probes_degrade_to_none() {
    assert_eq!(NoProbe.inspect("anything.mp4"), None);
    assert_eq!(FfprobeProbe.inspect("target/no-such-dir/clip.mp4"), None);
}
