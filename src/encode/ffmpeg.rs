use std::{
    ffi::OsString,
    io::Read,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    time::{Duration, Instant},
};

use crate::{
    foundation::error::{SnapError, SnapResult},
    render::filter_graph::FilterChain,
};

/// Everything one external clip encode needs.
#[derive(Clone, Debug)]
pub struct EncodeJob {
    /// Readable stream URI or file path.
    pub input_uri: String,
    /// Where the encoder writes the MP4. Callers pass a temporary path and rename on success.
    pub output_path: PathBuf,
    /// Empty when no transform was requested.
    pub filter_chain: FilterChain,
    /// Clip length, already clamped to the configured ceiling.
    pub duration_secs: u32,
    /// Wall-clock ceiling for the whole encode.
    pub timeout: Duration,
}

/// External transcoder collaborator.
pub trait Encoder: Send + Sync {
    /// Encode `job`, blocking until the output is complete, the encoder fails or the timeout
    /// elapses. On error the output path may hold a partial file; the caller discards it.
    fn encode(&self, job: &EncodeJob) -> SnapResult<()>;
}

/// [`Encoder`] that runs the system `ffmpeg`.
#[derive(Clone, Debug)]
pub struct FfmpegEncoder {
    program: PathBuf,
    poll_interval: Duration,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegEncoder {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            poll_interval: Duration::from_millis(50),
        }
    }

    /// Use a specific `ffmpeg` binary instead of the one on `PATH`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

/// Command-line arguments for `job`, without the program name.
pub(crate) fn ffmpeg_args(job: &EncodeJob) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-loglevel", "error"]
        .into_iter()
        .map(OsString::from)
        .collect();
    if job.input_uri.starts_with("rtsp://") || job.input_uri.starts_with("rtsps://") {
        args.extend(["-rtsp_transport", "tcp"].map(OsString::from));
    }
    args.push("-i".into());
    args.push(job.input_uri.clone().into());
    args.push("-t".into());
    args.push(job.duration_secs.to_string().into());
    if !job.filter_chain.is_empty() {
        args.push("-vf".into());
        args.push(job.filter_chain.to_string().into());
    }
    args.extend(
        [
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            "-movflags",
            "+faststart",
            "-f",
            "mp4",
        ]
        .map(OsString::from),
    );
    args.push(job.output_path.clone().into_os_string());
    args
}

impl Encoder for FfmpegEncoder {
    #[tracing::instrument(skip_all, fields(input = %job.input_uri, out = %job.output_path.display()))]
    fn encode(&self, job: &EncodeJob) -> SnapResult<()> {
        ensure_parent_dir(&job.output_path)?;

        let mut cmd = Command::new(&self.program);
        cmd.args(ffmpeg_args(job))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            SnapError::encode(format!(
                "failed to spawn '{}' (is it installed and on PATH?): {e}",
                self.program.display()
            ))
        })?;

        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| SnapError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok::<_, std::io::Error>(stderr_bytes)
        });

        let status = wait_with_timeout(&mut child, job.timeout, self.poll_interval)?;

        let stderr_bytes = stderr_drain
            .join()
            .map_err(|_| SnapError::encode("ffmpeg stderr drain thread panicked"))?
            .map_err(|e| SnapError::encode(format!("ffmpeg stderr read failed: {e}")))?;

        let Some(status) = status else {
            tracing::warn!(timeout_s = job.timeout.as_secs(), "ffmpeg killed after timeout");
            return Err(SnapError::EncodeTimeout(job.timeout));
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(SnapError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        tracing::debug!("ffmpeg finished");
        Ok(())
    }
}

/// Poll `child` until it exits or `timeout` elapses; on timeout the child is killed and reaped
/// and `None` is returned. A timeout too large to represent as an instant never fires.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
    poll: Duration,
) -> SnapResult<Option<std::process::ExitStatus>> {
    let deadline = Instant::now().checked_add(timeout);
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) if deadline.is_some_and(|d| Instant::now() >= d) => {
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            Ok(None) => std::thread::sleep(poll),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SnapError::encode(format!("failed to wait for ffmpeg: {e}")));
            }
        }
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> SnapResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `program -version` runs successfully.
pub fn is_tool_on_path(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
