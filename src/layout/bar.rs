use crate::{
    foundation::{core::Resolution, error::SnapResult},
    geometry::resolve::resolve_bar_height,
    layout::font::{BarFont, TextBrushRgba8, TextExtent, TextShaper, builtin_extent, layout_extent},
    request::model::{BarPosition, BarSpec, FontSize},
};

/// Horizontal distance between a side-anchored label and the frame edge.
pub const TEXT_MARGIN_PX: u32 = 10;
/// Smallest font size a bar label is drawn at.
pub const MIN_FONT_SIZE_PX: u32 = 10;

/// Turn a requested font size into pixels for a bar of `bar_px` height.
///
/// `Auto` is half the bar height rounded down. Every result is at least [`MIN_FONT_SIZE_PX`].
pub fn resolve_font_size(size: FontSize, bar_px: u32) -> u32 {
    let px = match size {
        FontSize::Auto => bar_px / 2,
        FontSize::Pixels(v) => v,
    };
    px.max(MIN_FONT_SIZE_PX)
}

/// Which of the three label slots a text occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAnchor {
    Left,
    Middle,
    Right,
}

impl TextAnchor {
    /// Left edge of a `text_w` wide label on a `frame_w` wide frame.
    ///
    /// May be negative when the label is wider than the frame.
    pub fn x_px(self, frame_w: u32, text_w: u32) -> i64 {
        let (fw, tw, m) = (
            i64::from(frame_w),
            i64::from(text_w),
            i64::from(TEXT_MARGIN_PX),
        );
        match self {
            Self::Left => m,
            Self::Middle => (fw - tw) / 2,
            Self::Right => fw - tw - m,
        }
    }

    /// The same position as an expression over the encoder's `w`/`tw` variables.
    pub fn x_expr(self) -> String {
        match self {
            Self::Left => TEXT_MARGIN_PX.to_string(),
            Self::Middle => "(w-tw)/2".to_owned(),
            Self::Right => format!("w-tw-{TEXT_MARGIN_PX}"),
        }
    }
}

/// One non-empty label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextSlot {
    pub anchor: TextAnchor,
    pub text: String,
}

/// Vertical band a bar occupies on a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarBand {
    pub top: u32,
    pub height: u32,
}

/// Bar request resolved to pixels, shared by both backends.
#[derive(Clone, Debug, PartialEq)]
pub struct BarPlan {
    pub position: BarPosition,
    pub height_px: u32,
    pub font_size_px: u32,
    pub font_color: String,
    pub bar_color: String,
    /// Labels in left, middle, right order; empty labels are absent.
    pub slots: Vec<TextSlot>,
}

impl BarPlan {
    /// Band covered by the bar on a frame `frame_h` pixels tall.
    pub fn band(&self, frame_h: u32) -> BarBand {
        let height = self.height_px.min(frame_h);
        let top = match self.position {
            BarPosition::Top => 0,
            BarPosition::Bottom => frame_h - height,
        };
        BarBand { top, height }
    }
}

/// Resolve `spec` against the height of the frame it will be painted on.
///
/// Returns the plan plus any non-fatal warnings raised while resolving the height.
pub fn plan_bar(spec: &BarSpec, frame_h: Option<u32>, default_px: u32) -> (BarPlan, Vec<String>) {
    let height = resolve_bar_height(frame_h, spec.height.as_ref(), default_px);
    let warnings = height.warning.into_iter().collect();

    let slots = [
        (TextAnchor::Left, &spec.text_left),
        (TextAnchor::Middle, &spec.text_middle),
        (TextAnchor::Right, &spec.text_right),
    ]
    .into_iter()
    .filter(|(_, text)| !text.is_empty())
    .map(|(anchor, text)| TextSlot {
        anchor,
        text: text.clone(),
    })
    .collect();

    let plan = BarPlan {
        position: spec.position,
        height_px: height.px,
        font_size_px: resolve_font_size(spec.font_size, height.px),
        font_color: spec.font_color.clone(),
        bar_color: spec.bar_color.clone(),
        slots,
    };
    (plan, warnings)
}

/// Glyph source for one placed label.
pub enum PlacedGlyphs {
    /// Shaped with an outline font; glyph positions are relative to the label origin.
    Shaped(parley::Layout<TextBrushRgba8>),
    /// Drawn with the built-in bitmap glyphs at an integer scale.
    Builtin { scale: u32 },
}

/// A measured label with its top-left corner in frame pixels.
pub struct PlacedText {
    pub anchor: TextAnchor,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub extent: TextExtent,
    pub glyphs: PlacedGlyphs,
}

/// Concrete positions for everything a raster backend paints for one bar.
pub struct BarLayout {
    pub band: BarBand,
    pub font_size_px: u32,
    pub placed: Vec<PlacedText>,
}

/// Measure and position the labels of `plan` on a frame of size `frame`.
///
/// Labels are vertically centered in the band regardless of bar position.
pub fn layout_bar(
    frame: Resolution,
    plan: &BarPlan,
    font: &BarFont,
    shaper: &mut TextShaper,
) -> SnapResult<BarLayout> {
    let band = plan.band(frame.height);
    let size = plan.font_size_px;

    let mut placed = Vec::with_capacity(plan.slots.len());
    for slot in &plan.slots {
        let (extent, glyphs) = match font {
            BarFont::Outline { path, bytes } => {
                let layout = shaper.shape(path, bytes, &slot.text, size as f32)?;
                (layout_extent(&layout), PlacedGlyphs::Shaped(layout))
            }
            BarFont::Builtin => (
                builtin_extent(&slot.text, size),
                PlacedGlyphs::Builtin {
                    scale: crate::layout::glyphs::scale_for(size),
                },
            ),
        };

        let text_w = extent.width.ceil().max(0.0) as u32;
        let x = slot.anchor.x_px(frame.width, text_w) as f64;
        let y = f64::from(band.top) + (f64::from(band.height) - f64::from(extent.height)) / 2.0;

        placed.push(PlacedText {
            anchor: slot.anchor,
            text: slot.text.clone(),
            x,
            y,
            extent,
            glyphs,
        });
    }

    tracing::debug!(
        band_top = band.top,
        band_height = band.height,
        font_size_px = size,
        labels = placed.len(),
        "bar laid out"
    );

    Ok(BarLayout {
        band,
        font_size_px: size,
        placed,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/layout/bar.rs"]
mod tests;
