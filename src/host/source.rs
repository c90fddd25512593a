use std::{
    path::{Path, PathBuf},
    process::Command,
    sync::Arc,
};

use crate::foundation::error::{SnapError, SnapResult};

/// Where a request's pixels come from.
///
/// Stills are requested as encoded bytes; clips as a URI the encoder can read directly.
pub trait FrameSource: Send + Sync {
    /// Encoded bytes of one still frame.
    fn fetch_still(&self) -> SnapResult<Vec<u8>>;

    /// A URI or path the external encoder can open.
    fn fetch_stream_uri(&self) -> SnapResult<String>;

    /// Short human-readable identity used in logs.
    fn describe(&self) -> String;
}

/// Pick a source for `spec`: anything with a URI scheme is a stream, everything else a file.
pub fn source_from_spec(spec: &str) -> Arc<dyn FrameSource> {
    if spec.contains("://") {
        Arc::new(StreamSource::new(spec))
    } else {
        Arc::new(FileSource::new(spec))
    }
}

/// A local image or video file.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for FileSource {
    fn fetch_still(&self) -> SnapResult<Vec<u8>> {
        std::fs::read(&self.path).map_err(|e| {
            SnapError::source_unavailable(format!("read '{}': {e}", self.path.display()))
        })
    }

    fn fetch_stream_uri(&self) -> SnapResult<String> {
        if !self.path.is_file() {
            return Err(SnapError::source_unavailable(format!(
                "'{}' is not a readable file",
                self.path.display()
            )));
        }
        Ok(self.path.to_string_lossy().into_owned())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// A network stream (`rtsp://`, `http://`, ...). Stills are grabbed as the first decoded frame.
#[derive(Clone, Debug)]
pub struct StreamSource {
    uri: String,
}

impl StreamSource {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

impl FrameSource for StreamSource {
    fn fetch_still(&self) -> SnapResult<Vec<u8>> {
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-v", "error"]);
        if self.uri.starts_with("rtsp://") || self.uri.starts_with("rtsps://") {
            cmd.args(["-rtsp_transport", "tcp"]);
        }
        let out = cmd
            .args(["-i", &self.uri])
            .args(["-frames:v", "1", "-f", "image2pipe", "-c:v", "png", "pipe:1"])
            .output()
            .map_err(|e| {
                SnapError::source_unavailable(format!("failed to run ffmpeg for frame grab: {e}"))
            })?;
        if !out.status.success() || out.stdout.is_empty() {
            return Err(SnapError::source_unavailable(format!(
                "no frame from '{}': {}",
                self.uri,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(out.stdout)
    }

    fn fetch_stream_uri(&self) -> SnapResult<String> {
        Ok(self.uri.clone())
    }

    fn describe(&self) -> String {
        self.uri.clone()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/source.rs"]
mod tests;
