use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::foundation::error::{SnapError, SnapResult};

/// Process-wide settings supplied once at startup and injected into the pipeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Base folder for relative destinations.
    pub snapshot_folder: PathBuf,
    /// Base folder for relative backup destinations.
    pub backup_folder: PathBuf,
    /// Base folder for relative font paths.
    pub font_folder: PathBuf,
    /// Font tried when the requested one cannot be read.
    pub default_font_path: Option<PathBuf>,
    /// Bar height used when the requested one is absent or unparseable.
    pub default_bar_height_px: u32,
    /// Ceiling for clip length.
    pub max_video_duration_secs: u32,
    /// Wall-clock ceiling for one external encode.
    pub encode_timeout_secs: u64,
    /// Fill for canvas regions exposed by rotation.
    pub rotate_fill_color: String,
    /// Quality for JPEG output, `1..=100`.
    pub jpeg_quality: u8,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            snapshot_folder: PathBuf::from("/config/snapshots"),
            backup_folder: PathBuf::from("/config/backups"),
            font_folder: PathBuf::from("/config/fonts"),
            default_font_path: None,
            default_bar_height_px: 40,
            max_video_duration_secs: 40,
            encode_timeout_secs: 120,
            rotate_fill_color: "black".to_owned(),
            jpeg_quality: 90,
        }
    }
}

impl SnapshotConfig {
    /// Parse a config from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> SnapResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| anyhow::anyhow!("parse snapshot config JSON: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> SnapResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            SnapError::Other(anyhow::anyhow!(
                "open snapshot config '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Reject settings no request could run under.
    pub fn validate(&self) -> SnapResult<()> {
        if self.max_video_duration_secs == 0 {
            return Err(anyhow::anyhow!("max_video_duration_secs must be non-zero").into());
        }
        if self.encode_timeout_secs == 0 {
            return Err(anyhow::anyhow!("encode_timeout_secs must be non-zero").into());
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(anyhow::anyhow!("jpeg_quality must be within 1..=100").into());
        }
        Ok(())
    }

    /// Wall-clock ceiling for one external encode.
    pub fn encode_timeout(&self) -> Duration {
        Duration::from_secs(self.encode_timeout_secs)
    }

    /// Clamp a requested clip length to the configured ceiling.
    pub fn clamp_duration(&self, requested_secs: u32) -> u32 {
        requested_secs.clamp(1, self.max_video_duration_secs)
    }

    pub(crate) fn resolve_destination(&self, path: &Path) -> PathBuf {
        join_relative(&self.snapshot_folder, path)
    }

    pub(crate) fn resolve_backup(&self, path: &Path) -> PathBuf {
        join_relative(&self.backup_folder, path)
    }

    pub(crate) fn resolve_font(&self, path: &Path) -> PathBuf {
        join_relative(&self.font_folder, path)
    }
}

fn join_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/request/config.rs"]
mod tests;
