use std::process::Command;

use crate::foundation::{
    core::Resolution,
    error::{SnapError, SnapResult},
};

/// Best-effort media metadata lookup.
pub trait Probe: Send + Sync {
    /// Frame size of the first video stream in `media`, or `None` when it cannot be determined.
    fn inspect(&self, media: &str) -> Option<Resolution>;
}

/// [`Probe`] backed by the system `ffprobe`.
#[derive(Clone, Debug, Default)]
pub struct FfprobeProbe;

impl Probe for FfprobeProbe {
    fn inspect(&self, media: &str) -> Option<Resolution> {
        match probe_dimensions(media) {
            Ok(res) => Some(res),
            Err(e) => {
                tracing::warn!(media, error = %e, "probe unavailable");
                None
            }
        }
    }
}

/// A probe that never knows anything.
#[derive(Clone, Debug, Default)]
pub struct NoProbe;

impl Probe for NoProbe {
    fn inspect(&self, _media: &str) -> Option<Resolution> {
        None
    }
}

fn probe_dimensions(media: &str) -> SnapResult<Resolution> {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-print_format",
            "json",
            "-show_streams",
        ])
        .arg(media)
        .output()
        .map_err(|e| anyhow::anyhow!("failed to run ffprobe: {e}"))?;
    if !out.status.success() {
        return Err(anyhow::anyhow!(
            "ffprobe failed for '{media}': {}",
            String::from_utf8_lossy(&out.stderr).trim()
        )
        .into());
    }
    parse_probe_json(&out.stdout)
}

pub(crate) fn parse_probe_json(bytes: &[u8]) -> SnapResult<Resolution> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
    }

    let parsed: ProbeOut = serde_json::from_slice(bytes)
        .map_err(|e| anyhow::anyhow!("ffprobe json parse failed: {e}"))?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| SnapError::Other(anyhow::anyhow!("no video stream found")))?;
    match (video.width, video.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Ok(Resolution::new(w, h)),
        _ => Err(anyhow::anyhow!("missing video width/height from ffprobe").into()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/probe.rs"]
mod tests;
