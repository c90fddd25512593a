use std::{fmt, path::PathBuf, sync::Arc};

use serde::{Deserialize, Deserializer};

use crate::host::source::FrameSource;

/// One invocation: user parameters paired with the frame source to read from.
#[derive(Clone)]
pub struct SnapshotRequest {
    /// Capability to obtain a still frame or a stream URI.
    pub source: Arc<dyn FrameSource>,
    /// User-facing parameters.
    pub params: SnapshotParams,
}

impl SnapshotRequest {
    /// Pair a source with parameters.
    pub fn new(source: Arc<dyn FrameSource>, params: SnapshotParams) -> Self {
        Self { source, params }
    }
}

impl fmt::Debug for SnapshotRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotRequest")
            .field("source", &self.source.describe())
            .field("params", &self.params)
            .finish()
    }
}

/// Declarative parameters of one snapshot, as received from the host.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SnapshotParams {
    /// Output location. Relative paths resolve against the configured snapshot folder.
    pub destination: PathBuf,
    /// Optional backup copy location. Relative paths resolve against the backup folder.
    #[serde(default)]
    pub backup_destination: Option<PathBuf>,
    /// Still image or short clip.
    #[serde(default)]
    pub media: MediaKind,
    /// Clockwise rotation in degrees, `0..=360`.
    #[serde(default)]
    pub rotate_angle: i64,
    /// `[x, y, w]` or `[x, y, w, h]`.
    #[serde(default)]
    pub crop: Option<Vec<i64>>,
    /// `W:H`, used only when `crop` omits its height.
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    /// Labeled bar overlay.
    #[serde(default)]
    pub bar: Option<BarSpec>,
}

impl SnapshotParams {
    /// Parameters that only persist the raw frame to `destination`.
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            backup_destination: None,
            media: MediaKind::Still,
            rotate_angle: 0,
            crop: None,
            aspect_ratio: None,
            bar: None,
        }
    }
}

/// What the source is asked for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaKind {
    /// A single decoded frame.
    #[default]
    Still,
    /// A clip recorded from the source stream.
    Video {
        /// Requested length; clamped to the configured ceiling.
        duration_secs: u32,
    },
}

/// Which edge the bar is painted on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarPosition {
    /// Upper edge.
    Top,
    /// Lower edge.
    #[default]
    Bottom,
}

/// Bar height as supplied by the user.
///
/// Deserialization never fails: unrecognized input is kept verbatim so the resolver can fall
/// back to the configured default and report it.
#[derive(Clone, Debug, PartialEq)]
pub enum BarHeight {
    /// Absolute pixels.
    Pixels(u32),
    /// Percentage of the frame height (`50.0` means half).
    Percent(f64),
    /// Input that is neither.
    Unparsed(String),
}

impl BarHeight {
    /// Parse `"40"`, `"12.5%"` and friends.
    pub fn parse(s: &str) -> Self {
        let t = s.trim();
        if let Some(pct) = t.strip_suffix('%') {
            return match pct.trim().parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => Self::Percent(v),
                _ => Self::Unparsed(s.to_owned()),
            };
        }
        match t.parse::<u32>() {
            Ok(v) => Self::Pixels(v),
            Err(_) => Self::Unparsed(s.to_owned()),
        }
    }
}

impl serde::Serialize for BarHeight {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Pixels(v) => serializer.serialize_u32(*v),
            Self::Percent(v) => serializer.serialize_str(&format!("{v}%")),
            Self::Unparsed(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for BarHeight {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Int(i64),
            Float(f64),
            Str(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Int(v) => u32::try_from(v)
                .map(Self::Pixels)
                .unwrap_or_else(|_| Self::Unparsed(v.to_string())),
            Repr::Float(v) if v.is_finite() && v >= 0.0 && v <= f64::from(u32::MAX) => {
                Self::Pixels(v.round() as u32)
            }
            Repr::Float(v) => Self::Unparsed(v.to_string()),
            Repr::Str(s) => Self::parse(&s),
        })
    }
}

/// Font size: explicit pixels or derived from the bar height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FontSize {
    /// `max(10, bar_height * 0.5)`.
    #[default]
    Auto,
    /// Explicit size; raised to the minimum of 10.
    Pixels(u32),
}

impl serde::Serialize for FontSize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Auto => serializer.serialize_str("auto"),
            Self::Pixels(v) => serializer.serialize_u32(*v),
        }
    }
}

impl<'de> Deserialize<'de> for FontSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Int(u32),
            Str(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Int(v) => Ok(Self::Pixels(v)),
            Repr::Str(s) if s.trim().eq_ignore_ascii_case("auto") => Ok(Self::Auto),
            Repr::Str(s) => s.trim().parse::<u32>().map(Self::Pixels).map_err(|_| {
                serde::de::Error::custom(format!(
                    "font_size must be an integer or \"auto\", got \"{s}\""
                ))
            }),
        }
    }
}

/// Bar overlay configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BarSpec {
    /// Edge the bar sits on.
    #[serde(default)]
    pub position: BarPosition,
    /// Bar height; `None` uses the configured default.
    #[serde(default)]
    pub height: Option<BarHeight>,
    /// TrueType/OpenType font file. Relative paths resolve against the font folder.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    /// Text color.
    #[serde(default = "default_font_color")]
    pub font_color: String,
    /// Bar fill color.
    #[serde(default = "default_bar_color")]
    pub bar_color: String,
    /// Text size.
    #[serde(default)]
    pub font_size: FontSize,
    /// Left-anchored label.
    #[serde(default)]
    pub text_left: String,
    /// Centered label.
    #[serde(default)]
    pub text_middle: String,
    /// Right-anchored label.
    #[serde(default)]
    pub text_right: String,
}

impl Default for BarSpec {
    fn default() -> Self {
        Self {
            position: BarPosition::default(),
            height: None,
            font_path: None,
            font_color: default_font_color(),
            bar_color: default_bar_color(),
            font_size: FontSize::Auto,
            text_left: String::new(),
            text_middle: String::new(),
            text_right: String::new(),
        }
    }
}

fn default_font_color() -> String {
    "black".to_owned()
}

fn default_bar_color() -> String {
    "white".to_owned()
}

#[cfg(test)]
#[path = "../../tests/unit/request/model.rs"]
mod tests;
