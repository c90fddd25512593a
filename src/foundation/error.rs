use std::time::Duration;

/// Convenience result type used across snapmark.
pub type SnapResult<T> = Result<T, SnapError>;

/// Top-level error taxonomy used by pipeline stages.
#[derive(thiserror::Error, Debug)]
pub enum SnapError {
    /// No frame or stream could be obtained from the source.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Crop, aspect ratio, or rotation input rejected by the geometry resolver.
    #[error("invalid parameter: {0}")]
    InvalidParameter(#[from] ParamError),

    /// A font could not be loaded. Never fatal: recorded as a warning.
    #[error("font unavailable: {0}")]
    FontUnavailable(String),

    /// The external encoder or an in-process codec failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// The external encoder exceeded its wall-clock ceiling.
    #[error("encode timed out after {}s", .0.as_secs())]
    EncodeTimeout(Duration),

    /// The primary artifact was written but the backup copy was not.
    #[error("backup failed: {0}")]
    BackupFailed(String),

    /// The primary artifact could not be persisted.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Validation failures raised while resolving user geometry.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    /// Crop tuple has the wrong arity or non-positive extents.
    #[error("invalid crop: {0}")]
    InvalidCrop(String),

    /// Aspect ratio is not of the form `W:H` with positive numbers.
    #[error("invalid aspect ratio '{0}' (expected W:H)")]
    InvalidAspectRatio(String),

    /// Crop omitted its height and no aspect ratio was supplied to derive it.
    #[error("crop height missing and no aspect ratio given")]
    MissingHeight,

    /// Crop rectangle leaves the frame.
    #[error(
        "crop {x},{y} {width}x{height} exceeds frame {frame_width}x{frame_height}"
    )]
    CropOutOfBounds {
        /// Left edge.
        x: i64,
        /// Top edge.
        y: i64,
        /// Crop width.
        width: i64,
        /// Crop height.
        height: i64,
        /// Frame width the crop was checked against.
        frame_width: u32,
        /// Frame height the crop was checked against.
        frame_height: u32,
    },

    /// Rotation angle outside `0..=360`.
    #[error("invalid rotation {0} (expected 0..=360 degrees)")]
    InvalidRotation(i64),
}

/// Serializable classification of a [`SnapError`], reported in results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`SnapError::SourceUnavailable`].
    SourceUnavailable,
    /// See [`SnapError::InvalidParameter`].
    InvalidParameter,
    /// See [`SnapError::FontUnavailable`].
    FontUnavailable,
    /// See [`SnapError::Encode`].
    EncodeError,
    /// See [`SnapError::EncodeTimeout`].
    EncodeTimeout,
    /// See [`SnapError::BackupFailed`].
    BackupFailed,
    /// See [`SnapError::WriteFailed`].
    WriteFailed,
    /// Anything else, including panics caught at the pipeline boundary.
    Internal,
}

impl SnapError {
    /// Build a [`SnapError::SourceUnavailable`] value.
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Build a [`SnapError::FontUnavailable`] value.
    pub fn font_unavailable(msg: impl Into<String>) -> Self {
        Self::FontUnavailable(msg.into())
    }

    /// Build a [`SnapError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`SnapError::BackupFailed`] value.
    pub fn backup_failed(msg: impl Into<String>) -> Self {
        Self::BackupFailed(msg.into())
    }

    /// Build a [`SnapError::WriteFailed`] value.
    pub fn write_failed(msg: impl Into<String>) -> Self {
        Self::WriteFailed(msg.into())
    }

    /// Classify this error for result reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceUnavailable(_) => ErrorKind::SourceUnavailable,
            Self::InvalidParameter(_) => ErrorKind::InvalidParameter,
            Self::FontUnavailable(_) => ErrorKind::FontUnavailable,
            Self::Encode(_) => ErrorKind::EncodeError,
            Self::EncodeTimeout(_) => ErrorKind::EncodeTimeout,
            Self::BackupFailed(_) => ErrorKind::BackupFailed,
            Self::WriteFailed(_) => ErrorKind::WriteFailed,
            Self::Other(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
