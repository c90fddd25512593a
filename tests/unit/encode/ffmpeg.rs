use super::*;
use crate::{
    geometry::resolve::CropRect,
    render::filter_graph::FilterStage,
};

fn job(uri: &str, chain: FilterChain) -> EncodeJob {
    EncodeJob {
        input_uri: uri.to_owned(),
        output_path: PathBuf::from("target/unit-ffmpeg/out.mp4.part"),
        filter_chain: chain,
        duration_secs: 12,
        timeout: Duration::from_secs(5),
    }
}

fn as_strings(args: Vec<OsString>) -> Vec<String> {
    args.into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn args_without_filters_skip_vf() {
    let args = as_strings(ffmpeg_args(&job("in.mp4", FilterChain::default())));
    assert!(!args.iter().any(|a| a == "-vf"));
    let t = args.iter().position(|a| a == "-t").unwrap();
    assert_eq!(args[t + 1], "12");
    assert_eq!(args.last().unwrap(), "target/unit-ffmpeg/out.mp4.part");
    for flag in ["libx264", "yuv420p", "aac", "+faststart", "mp4"] {
        assert!(args.iter().any(|a| a == flag), "missing {flag}");
    }
}

#[test]
fn args_carry_filter_chain_and_rtsp_transport() {
    let mut chain = FilterChain::default();
    chain.push(FilterStage::Crop(CropRect {
        x: 0,
        y: 0,
        width: 64,
        height: 32,
    }));
    let args = as_strings(ffmpeg_args(&job("rtsp://cam.local/stream", chain)));
    let vf = args.iter().position(|a| a == "-vf").unwrap();
    assert_eq!(args[vf + 1], "crop=64:32:0:0");

    let transport = args.iter().position(|a| a == "-rtsp_transport").unwrap();
    let input = args.iter().position(|a| a == "-i").unwrap();
    assert!(transport < input);
}

#[test]
fn missing_program_is_an_encode_error() {
    let encoder = FfmpegEncoder::new().with_program("target/no-such-dir/ffmpeg");
    let err = encoder
        .encode(&job("in.mp4", FilterChain::default()))
        .unwrap_err();
    assert!(matches!(err, SnapError::Encode(_)), "{err:?}");
}

#[cfg(unix)]
#[test]
fn nonzero_exit_is_an_encode_error() {
    let encoder = FfmpegEncoder::new().with_program("false");
    let err = encoder
        .encode(&job("in.mp4", FilterChain::default()))
        .unwrap_err();
    assert!(err.to_string().contains("exited with status"), "{err}");
}

#[cfg(unix)]
#[test]
fn slow_child_is_killed_at_deadline() {
    let mut child = Command::new("sleep").arg("5").spawn().unwrap();
    let started = Instant::now();
    let status = wait_with_timeout(
        &mut child,
        Duration::from_millis(100),
        Duration::from_millis(10),
    )
    .unwrap();
    assert!(status.is_none());
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[cfg(unix)]
#[test]
fn fast_child_reports_status() {
    let mut child = Command::new("true").spawn().unwrap();
    let status = wait_with_timeout(&mut child, Duration::from_secs(5), Duration::from_millis(5))
        .unwrap()
        .unwrap();
    assert!(status.success());
}

#[cfg(unix)]
#[test]
fn unrepresentable_timeout_waits_for_exit() {
    let mut child = Command::new("true").spawn().unwrap();
    let status = wait_with_timeout(&mut child, Duration::MAX, Duration::from_millis(5))
        .unwrap()
        .unwrap();
    assert!(status.success());
}
