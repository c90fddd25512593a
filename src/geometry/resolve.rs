use crate::{
    foundation::{core::Resolution, error::ParamError},
    request::model::{BarHeight, SnapshotParams},
};

/// A validated crop rectangle in frame pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width, always > 0.
    pub width: u32,
    /// Height, always > 0.
    pub height: u32,
}

impl CropRect {
    /// The rectangle covering the whole frame.
    pub fn full(frame: Resolution) -> Self {
        Self {
            x: 0,
            y: 0,
            width: frame.width,
            height: frame.height,
        }
    }

    /// Dimensions of the cropped output.
    pub fn size(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// Whether this rectangle is a no-op on a frame of size `frame`.
    pub fn is_identity_for(&self, frame: Resolution) -> bool {
        *self == Self::full(frame)
    }
}

/// `W:H` ratio used to derive an omitted crop height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AspectRatio {
    /// Horizontal term.
    pub w: f64,
    /// Vertical term.
    pub h: f64,
}

impl AspectRatio {
    /// Parse `"16:9"` (also accepts `/` and `x` separators).
    pub fn parse(s: &str) -> Result<Self, ParamError> {
        let bad = || ParamError::InvalidAspectRatio(s.to_owned());
        let (w, h) = s
            .split_once([':', '/', 'x'])
            .ok_or_else(bad)?;
        let w: f64 = w.trim().parse().map_err(|_| bad())?;
        let h: f64 = h.trim().parse().map_err(|_| bad())?;
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return Err(bad());
        }
        Ok(Self { w, h })
    }

    /// Height matching `width` under this ratio.
    pub fn height_for(&self, width: i64) -> i64 {
        (width as f64 * self.h / self.w).round() as i64
    }
}

/// A validated clockwise rotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rotation {
    degrees: u32,
}

impl Rotation {
    /// Angle in degrees, `0..=360`.
    pub fn degrees(self) -> u32 {
        self.degrees
    }

    /// Angle in radians.
    pub fn radians(self) -> f64 {
        f64::from(self.degrees).to_radians()
    }

    /// 0 and 360 leave the frame untouched.
    pub fn is_identity(self) -> bool {
        self.degrees % 360 == 0
    }

    /// Number of clockwise quarter turns when the angle is a multiple of 90.
    pub fn quarter_turns(self) -> Option<u32> {
        self.degrees
            .is_multiple_of(90)
            .then_some((self.degrees / 90) % 4)
    }
}

/// Validate a user rotation. 0 is accepted as the identity.
pub fn resolve_rotation(angle: i64) -> Result<Rotation, ParamError> {
    if !(0..=360).contains(&angle) {
        return Err(ParamError::InvalidRotation(angle));
    }
    Ok(Rotation {
        degrees: angle as u32,
    })
}

/// Size of the canvas that holds `frame` rotated by `rotation` without clipping corners.
pub fn rotated_bounds(frame: Resolution, rotation: Rotation) -> Resolution {
    match rotation.quarter_turns() {
        Some(0) => frame,
        Some(2) => frame,
        Some(_) => frame.transposed(),
        None => {
            let rect = kurbo::Rect::new(0.0, 0.0, f64::from(frame.width), f64::from(frame.height));
            let bbox = kurbo::Affine::rotate(rotation.radians()).transform_rect_bbox(rect);
            // Trim float noise before rounding up so exact fits don't gain a pixel.
            let snap = |v: f64| (v - 1e-6).ceil().max(1.0) as u32;
            Resolution::new(snap(bbox.width()), snap(bbox.height()))
        }
    }
}

/// Resolve a user crop against the frame it will be applied to.
///
/// Absent crop yields the full-frame rectangle. The returned rectangle always lies inside the
/// frame; nothing is clamped.
pub fn resolve_crop(
    frame_w: u32,
    frame_h: u32,
    crop: Option<&[i64]>,
    aspect_ratio: Option<&str>,
) -> Result<CropRect, ParamError> {
    let frame = Resolution::new(frame_w, frame_h);
    let Some(crop) = crop else {
        return Ok(CropRect::full(frame));
    };
    let (x, y, w, h) = crop_terms(crop, aspect_ratio)?;
    check_bounds(x, y, w, h, Some(frame))
}

/// Resolve a crop when the frame size is unknown: only sign checks apply.
pub fn resolve_crop_unbounded(
    crop: &[i64],
    aspect_ratio: Option<&str>,
) -> Result<CropRect, ParamError> {
    let (x, y, w, h) = crop_terms(crop, aspect_ratio)?;
    check_bounds(x, y, w, h, None)
}

fn crop_terms(
    crop: &[i64],
    aspect_ratio: Option<&str>,
) -> Result<(i64, i64, i64, i64), ParamError> {
    match *crop {
        [x, y, w, h] => Ok((x, y, w, h)),
        [x, y, w] => {
            let ratio = aspect_ratio.ok_or(ParamError::MissingHeight)?;
            let ratio = AspectRatio::parse(ratio)?;
            Ok((x, y, w, ratio.height_for(w)))
        }
        _ => Err(ParamError::InvalidCrop(format!(
            "expected [x, y, w] or [x, y, w, h], got {} values",
            crop.len()
        ))),
    }
}

fn check_bounds(
    x: i64,
    y: i64,
    w: i64,
    h: i64,
    frame: Option<Resolution>,
) -> Result<CropRect, ParamError> {
    let (fw, fh) = frame
        .map(|f| (i64::from(f.width), i64::from(f.height)))
        .unwrap_or((i64::from(u32::MAX), i64::from(u32::MAX)));
    let inside = x >= 0
        && y >= 0
        && w > 0
        && h > 0
        && x.saturating_add(w) <= fw
        && y.saturating_add(h) <= fh;
    if !inside {
        let frame = frame.unwrap_or(Resolution::new(u32::MAX, u32::MAX));
        return Err(ParamError::CropOutOfBounds {
            x,
            y,
            width: w,
            height: h,
            frame_width: frame.width,
            frame_height: frame.height,
        });
    }
    Ok(CropRect {
        x: x as u32,
        y: y as u32,
        width: w as u32,
        height: h as u32,
    })
}

/// Bar height in pixels, plus the reason when the request could not be honoured as given.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarHeightResolution {
    /// Resolved height, `<= frame height` when the frame height is known.
    pub px: u32,
    /// Non-fatal diagnostic.
    pub warning: Option<String>,
}

/// Turn a user bar height into pixels.
///
/// Percentages scale `frame_h`; unparseable input (or a percentage with unknown frame height)
/// falls back to `default_px` and reports a warning instead of failing.
pub fn resolve_bar_height(
    frame_h: Option<u32>,
    spec: Option<&BarHeight>,
    default_px: u32,
) -> BarHeightResolution {
    let (px, mut warning) = match spec {
        None => (default_px, None),
        Some(BarHeight::Pixels(v)) => (*v, None),
        Some(BarHeight::Percent(pct)) => match frame_h {
            Some(h) => ((pct / 100.0 * f64::from(h)).floor() as u32, None),
            None => (
                default_px,
                Some(format!(
                    "bar height {pct}% needs the frame height, which is unknown; using {default_px}px"
                )),
            ),
        },
        Some(BarHeight::Unparsed(raw)) => (
            default_px,
            Some(format!(
                "invalid bar height \"{raw}\"; using {default_px}px"
            )),
        ),
    };

    let px = match frame_h {
        Some(h) if px > h => {
            warning.get_or_insert_with(|| {
                format!("bar height {px}px exceeds frame height {h}px; clamped")
            });
            h
        }
        _ => px,
    };

    BarHeightResolution { px, warning }
}

/// Geometry of one request resolved against the source frame, before any pixel work.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedGeometry {
    /// Decoded/probed source size, when known.
    pub source: Option<Resolution>,
    /// Validated rotation.
    pub rotation: Rotation,
    /// Canvas size after rotation, when the source size is known.
    pub rotated: Option<Resolution>,
    /// Crop to apply after rotation; `None` when no crop was requested.
    pub crop: Option<CropRect>,
}

impl ResolvedGeometry {
    /// Output size after rotate and crop, when it can be known.
    pub fn output(&self) -> Option<Resolution> {
        match self.crop {
            Some(c) => Some(c.size()),
            None => self.rotated,
        }
    }
}

/// Validate rotation and crop of `params` against a source of size `source`.
///
/// Crop coordinates refer to the rotated frame.
pub fn resolve_geometry(
    source: Option<Resolution>,
    params: &SnapshotParams,
) -> Result<ResolvedGeometry, ParamError> {
    let rotation = resolve_rotation(params.rotate_angle)?;
    let rotated = source.map(|s| rotated_bounds(s, rotation));
    let crop = match (params.crop.as_deref(), rotated) {
        (None, _) => None,
        (Some(c), Some(frame)) => Some(resolve_crop(
            frame.width,
            frame.height,
            Some(c),
            params.aspect_ratio.as_deref(),
        )?),
        (Some(c), None) => Some(resolve_crop_unbounded(c, params.aspect_ratio.as_deref())?),
    };
    let crop = crop.filter(|c| rotated.is_none_or(|frame| !c.is_identity_for(frame)));

    Ok(ResolvedGeometry {
        source,
        rotation,
        rotated,
        crop,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/resolve.rs"]
mod tests;
