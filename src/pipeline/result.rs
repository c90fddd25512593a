use std::path::PathBuf;

use crate::foundation::{
    core::Resolution,
    error::{ErrorKind, SnapError},
};

/// Pipeline step a run was in when it ended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Start,
    Fetching,
    Validating,
    Transforming,
    Encoding,
    Writing,
    Backup,
    Done,
}

/// Structured failure carried by a [`SnapshotResult`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResultError {
    pub kind: ErrorKind,
    pub message: String,
    /// Step that failed.
    pub stage: Stage,
}

impl ResultError {
    pub fn from_error(err: &SnapError, stage: Stage) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            stage,
        }
    }
}

/// The single outcome of one [`crate::SnapshotPipeline::run`] call.
///
/// `success` is false whenever `error` is set. A backup failure keeps `output_path` pointing at
/// the primary artifact that was written.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SnapshotResult {
    pub success: bool,
    /// Primary artifact, set once it is on disk.
    pub output_path: Option<PathBuf>,
    /// Backup location, set once a backup was attempted.
    pub backup_path: Option<PathBuf>,
    /// Frame size before any transform, when known.
    pub original_resolution: Option<Resolution>,
    /// Frame size after every transform, when known.
    pub final_resolution: Option<Resolution>,
    pub error: Option<ResultError>,
    /// Non-fatal diagnostics (font fallback, bar height fallback, ...).
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl SnapshotResult {
    /// Human-readable one-line summary for logs.
    pub fn summary(&self) -> String {
        match (&self.error, &self.output_path) {
            (None, Some(path)) => format!("ok: {}", path.display()),
            (None, None) => "ok".to_owned(),
            (Some(err), _) => format!("failed at {:?}: {}", err.stage, err.message),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/result.rs"]
mod tests;
