use std::{fmt, fmt::Write as _, path::PathBuf};

use crate::{
    foundation::{color::ffmpeg_color, core::Resolution, error::SnapResult},
    geometry::resolve::{CropRect, ResolvedGeometry, Rotation, rotated_bounds},
    layout::{bar::BarPlan, font::BarFont},
    render::backend::{ImageTransformBackend, apply_transforms},
    request::model::BarPosition,
};

/// Letters drawtext receives as `\u00XX` code point escapes.
const CODE_POINT_ESCAPED: &str =
    "äöüÄÖÜßàáâèéêëìíîïòóôùúûçñÀÁÂÈÉÊËÌÍÎÏÒÓÔÙÚÛÇÑ";

/// Map accented letters of a drawtext label to `\u00XX` code point escapes.
///
/// This is the text drawtext should receive. Use [`quote_filter_value`] to embed it in a chain.
pub fn escape_drawtext(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if CODE_POINT_ESCAPED.contains(c) {
            let _ = write!(out, "\\u{:04x}", u32::from(c));
        } else {
            out.push(c);
        }
    }
    out
}

/// Characters the filter option parser treats specially.
const OPTION_SPECIAL: &[char] = &['\\', '\'', ':'];
/// Characters the filtergraph parser treats specially.
const GRAPH_SPECIAL: &[char] = &['\\', '\'', '[', ']', ',', ';'];

/// Escape `value` so it reaches a filter option intact through both parsing levels of a `-vf`
/// argument. Each level strips one layer of backslashes.
pub fn quote_filter_value(value: &str) -> String {
    backslash_escape(&backslash_escape(value, OPTION_SPECIAL), GRAPH_SPECIAL)
}

fn backslash_escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// One filter in a video filter chain.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterStage {
    /// Clockwise rotation onto an expanded canvas. `size` is `None` when the input size is
    /// unknown, in which case the encoder computes the bounds.
    Rotate {
        radians: f64,
        size: Option<Resolution>,
        fill: String,
    },
    Crop(CropRect),
    /// Solid bar background.
    DrawBox {
        position: BarPosition,
        height: u32,
        color: String,
    },
    DrawText {
        font_file: Option<PathBuf>,
        text: String,
        size: u32,
        color: String,
        x: String,
        y: String,
    },
    /// Round odd dimensions down to even, as required by 4:2:0 chroma subsampling.
    EvenSize,
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rotate {
                radians,
                size,
                fill,
            } => {
                write!(f, "rotate=a={radians:.6}")?;
                match size {
                    Some(s) => write!(f, ":ow={}:oh={}", s.width, s.height)?,
                    None => f.write_str(":ow=rotw(a):oh=roth(a)")?,
                }
                write!(f, ":c={fill}")
            }
            Self::Crop(r) => write!(f, "crop={}:{}:{}:{}", r.width, r.height, r.x, r.y),
            Self::DrawBox {
                position,
                height,
                color,
            } => {
                let y = match position {
                    BarPosition::Top => "0".to_owned(),
                    BarPosition::Bottom => format!("ih-{height}"),
                };
                write!(f, "drawbox=x=0:y={y}:w=iw:h={height}:color={color}:t=fill")
            }
            Self::DrawText {
                font_file,
                text,
                size,
                color,
                x,
                y,
            } => {
                // Expansion off: `%` in a label is literal.
                f.write_str("drawtext=expansion=none:")?;
                if let Some(path) = font_file {
                    write!(
                        f,
                        "fontfile={}:",
                        quote_filter_value(&path.to_string_lossy())
                    )?;
                }
                write!(
                    f,
                    "text={}:fontsize={size}:fontcolor={color}:x={x}:y={y}",
                    quote_filter_value(&escape_drawtext(text))
                )
            }
            Self::EvenSize => f.write_str("scale=trunc(iw/2)*2:trunc(ih/2)*2"),
        }
    }
}

/// Ordered filter stages, rendered as a comma-separated `-vf` argument.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterChain {
    stages: Vec<FilterStage>,
}

impl FilterChain {
    pub fn push(&mut self, stage: FilterStage) {
        self.stages.push(stage);
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{stage}")?;
        }
        Ok(())
    }
}

/// Backend that expresses the transforms as encoder filters instead of touching pixels.
///
/// Tracks the frame size through the chain when the source size is known so rotation bounds
/// are exact.
pub struct FilterGraphBackend {
    frame: Option<Resolution>,
    fill: String,
    font_file: Option<PathBuf>,
}

impl FilterGraphBackend {
    pub fn new(source: Option<Resolution>, fill_color: &str, font: &BarFont) -> Self {
        Self {
            frame: source,
            fill: ffmpeg_color(fill_color),
            font_file: font.path().map(|p| p.to_path_buf()),
        }
    }

    /// Frame size after the stages pushed so far, when known.
    pub fn frame(&self) -> Option<Resolution> {
        self.frame
    }
}

impl ImageTransformBackend for FilterGraphBackend {
    type Frame = FilterChain;

    fn rotate(&mut self, mut chain: FilterChain, rotation: Rotation) -> SnapResult<FilterChain> {
        let size = self.frame.map(|f| rotated_bounds(f, rotation));
        chain.push(FilterStage::Rotate {
            radians: rotation.radians(),
            size,
            fill: self.fill.clone(),
        });
        self.frame = size;
        Ok(chain)
    }

    fn crop(&mut self, mut chain: FilterChain, rect: CropRect) -> SnapResult<FilterChain> {
        chain.push(FilterStage::Crop(rect));
        self.frame = Some(rect.size());
        Ok(chain)
    }

    fn overlay_bar(&mut self, mut chain: FilterChain, bar: &BarPlan) -> SnapResult<FilterChain> {
        let height = match self.frame {
            Some(f) => bar.height_px.min(f.height),
            None => bar.height_px,
        };
        if height == 0 {
            return Ok(chain);
        }

        chain.push(FilterStage::DrawBox {
            position: bar.position,
            height,
            color: ffmpeg_color(&bar.bar_color),
        });

        let y = match bar.position {
            BarPosition::Top => format!("({height}-th)/2"),
            BarPosition::Bottom => format!("h-{height}+({height}-th)/2"),
        };
        let color = ffmpeg_color(&bar.font_color);
        for slot in &bar.slots {
            chain.push(FilterStage::DrawText {
                font_file: self.font_file.clone(),
                text: slot.text.clone(),
                size: bar.font_size_px,
                color: color.clone(),
                x: slot.anchor.x_expr(),
                y: y.clone(),
            });
        }
        Ok(chain)
    }
}

/// A finished chain plus the output size it produces, when known.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoPlan {
    pub chain: FilterChain,
    pub final_resolution: Option<Resolution>,
}

/// Build the filter chain for a clip whose frames measure `source` (when probed).
pub fn build_filter_chain(
    source: Option<Resolution>,
    geometry: &ResolvedGeometry,
    bar: Option<&BarPlan>,
    fill_color: &str,
    font: &BarFont,
) -> SnapResult<VideoPlan> {
    let mut backend = FilterGraphBackend::new(source, fill_color, font);
    let mut chain = apply_transforms(&mut backend, FilterChain::default(), geometry, bar)?;

    let final_resolution = match backend.frame() {
        Some(f) if f.width.is_multiple_of(2) && f.height.is_multiple_of(2) => Some(f),
        Some(f) => {
            chain.push(FilterStage::EvenSize);
            Some(Resolution::new(f.width & !1, f.height & !1))
        }
        None => {
            chain.push(FilterStage::EvenSize);
            None
        }
    };

    tracing::debug!(chain = %chain, "filter chain built");
    Ok(VideoPlan {
        chain,
        final_resolution,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/filter_graph.rs"]
mod tests;
