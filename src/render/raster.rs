use std::sync::Arc;

use anyhow::Context;
use image::{RgbaImage, imageops};

use crate::{
    foundation::{
        color::parse_color,
        core::{Resolution, Rgba8},
        error::{ParamError, SnapError, SnapResult},
        math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place},
    },
    geometry::resolve::{CropRect, ResolvedGeometry, Rotation, rotated_bounds},
    layout::{
        bar::{BarPlan, PlacedGlyphs, layout_bar},
        font::{BarFont, TextShaper},
        glyphs,
    },
    render::backend::{ImageTransformBackend, apply_transforms},
};

/// A still frame after every transform, with the sizes reported back to the caller.
#[derive(Clone, Debug)]
pub struct CompositeOutput {
    pub image: RgbaImage,
    /// Size right after decode.
    pub original_resolution: Resolution,
    /// Size after rotate and crop.
    pub final_resolution: Resolution,
}

/// Decode still bytes (any format `image` recognizes) to straight-alpha RGBA8.
pub fn decode_still(bytes: &[u8]) -> SnapResult<RgbaImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| SnapError::source_unavailable(format!("decode still image: {e}")))?;
    Ok(img.to_rgba8())
}

/// CPU backend working on decoded pixels.
///
/// Right-angle rotations and crops are exact pixel moves; arbitrary rotations and the bar are
/// drawn with `vello_cpu`.
pub struct RasterBackend {
    fill: Rgba8,
    font: BarFont,
    shaper: TextShaper,
    warnings: Vec<String>,
}

impl RasterBackend {
    pub fn new(fill_color: &str, font: BarFont) -> Self {
        let mut warnings = Vec::new();
        let fill = resolve_color(fill_color, Rgba8::rgb(0, 0, 0), "rotate fill", &mut warnings);
        Self {
            fill,
            font,
            shaper: TextShaper::new(),
            warnings,
        }
    }

    /// Share an already populated shaper (fonts registered while loading).
    pub fn with_shaper(mut self, shaper: TextShaper) -> Self {
        self.shaper = shaper;
        self
    }

    /// Non-fatal diagnostics collected so far.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }
}

impl ImageTransformBackend for RasterBackend {
    type Frame = RgbaImage;

    fn rotate(&mut self, frame: RgbaImage, rotation: Rotation) -> SnapResult<RgbaImage> {
        match rotation.quarter_turns() {
            Some(0) => Ok(frame),
            Some(1) => Ok(imageops::rotate90(&frame)),
            Some(2) => Ok(imageops::rotate180(&frame)),
            Some(_) => Ok(imageops::rotate270(&frame)),
            None => rotate_resampled(&frame, rotation, self.fill),
        }
    }

    fn crop(&mut self, frame: RgbaImage, rect: CropRect) -> SnapResult<RgbaImage> {
        let (w, h) = frame.dimensions();
        let fits = u64::from(rect.x) + u64::from(rect.width) <= u64::from(w)
            && u64::from(rect.y) + u64::from(rect.height) <= u64::from(h);
        if !fits {
            return Err(ParamError::CropOutOfBounds {
                x: rect.x.into(),
                y: rect.y.into(),
                width: rect.width.into(),
                height: rect.height.into(),
                frame_width: w,
                frame_height: h,
            }
            .into());
        }
        Ok(imageops::crop_imm(&frame, rect.x, rect.y, rect.width, rect.height).to_image())
    }

    fn overlay_bar(&mut self, mut frame: RgbaImage, bar: &BarPlan) -> SnapResult<RgbaImage> {
        let size = Resolution::new(frame.width(), frame.height());
        let layout = layout_bar(size, bar, &self.font, &mut self.shaper)?;
        let band = layout.band;
        if band.height == 0 || size.width == 0 {
            return Ok(frame);
        }

        let bar_color = resolve_color(
            &bar.bar_color,
            Rgba8::rgb(255, 255, 255),
            "bar",
            &mut self.warnings,
        );
        let font_color = resolve_color(
            &bar.font_color,
            Rgba8::rgb(0, 0, 0),
            "font",
            &mut self.warnings,
        );

        let (w16, h16) = canvas_dims(size.width, band.height)?;
        let row_bytes = size.width as usize * 4;
        let start = band.top as usize * row_bytes;
        let end = start + band.height as usize * row_bytes;
        let raw: &mut [u8] = &mut frame;
        let band_px = &mut raw[start..end];

        let mut ctx = vello_cpu::RenderContext::new(w16, h16);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        // Existing pixels first so a translucent bar color blends over the frame.
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(image_paint(band_px, size.width, band.height)?);
        ctx.fill_rect(&full_rect(size.width, band.height));

        ctx.set_paint(cpu_color(bar_color));
        ctx.fill_rect(&full_rect(size.width, band.height));

        let font_data = match &self.font {
            BarFont::Outline { bytes, .. } => Some(vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
                0,
            )),
            BarFont::Builtin => None,
        };

        for placed in &layout.placed {
            let origin_y = placed.y - f64::from(band.top);
            ctx.set_paint(cpu_color(font_color));
            match (&placed.glyphs, &font_data) {
                (PlacedGlyphs::Shaped(text_layout), Some(font)) => {
                    ctx.set_transform(vello_cpu::kurbo::Affine::translate((placed.x, origin_y)));
                    for line in text_layout.lines() {
                        for item in line.items() {
                            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                                continue;
                            };
                            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                                id: g.id,
                                x: g.x,
                                y: g.y,
                            });
                            ctx.glyph_run(font)
                                .font_size(run.run().font_size())
                                .fill_glyphs(glyphs);
                        }
                    }
                }
                (PlacedGlyphs::Builtin { scale }, _) => {
                    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                    let s = f64::from(*scale);
                    for (cx, cy) in glyphs::lit_cells(&placed.text, *scale) {
                        let x0 = placed.x.round() + f64::from(cx);
                        let y0 = origin_y.round() + f64::from(cy);
                        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(x0, y0, x0 + s, y0 + s));
                    }
                }
                (PlacedGlyphs::Shaped(_), None) => {
                    return Err(anyhow::anyhow!("shaped label without an outline font").into());
                }
            }
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
        ctx.render_to_pixmap(&mut pixmap);

        band_px.copy_from_slice(pixmap.data_as_u8_slice());
        unpremultiply_rgba8_in_place(band_px);
        Ok(frame)
    }
}

/// Apply rotate, crop and bar to a decoded still.
#[tracing::instrument(skip_all, fields(w = frame.width(), h = frame.height()))]
pub fn composite(
    frame: RgbaImage,
    geometry: &ResolvedGeometry,
    bar: Option<&BarPlan>,
    backend: &mut RasterBackend,
) -> SnapResult<CompositeOutput> {
    let original_resolution = Resolution::new(frame.width(), frame.height());
    let image = apply_transforms(backend, frame, geometry, bar)?;
    let final_resolution = Resolution::new(image.width(), image.height());
    tracing::debug!(%original_resolution, %final_resolution, "still composited");
    Ok(CompositeOutput {
        image,
        original_resolution,
        final_resolution,
    })
}

fn rotate_resampled(src: &RgbaImage, rotation: Rotation, fill: Rgba8) -> SnapResult<RgbaImage> {
    let (sw, sh) = src.dimensions();
    let dst = rotated_bounds(Resolution::new(sw, sh), rotation);
    let (w16, h16) = canvas_dims(dst.width, dst.height)?;

    let mut ctx = vello_cpu::RenderContext::new(w16, h16);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(cpu_color(fill));
    ctx.fill_rect(&full_rect(dst.width, dst.height));

    // Center of the source onto the center of the expanded canvas.
    let xf = kurbo::Affine::translate((f64::from(dst.width) / 2.0, f64::from(dst.height) / 2.0))
        * kurbo::Affine::rotate(rotation.radians())
        * kurbo::Affine::translate((-f64::from(sw) / 2.0, -f64::from(sh) / 2.0));
    ctx.set_transform(vello_cpu::kurbo::Affine::new(xf.as_coeffs()));
    ctx.set_paint(image_paint(src.as_raw(), sw, sh)?);
    ctx.fill_rect(&full_rect(sw, sh));

    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
    ctx.render_to_pixmap(&mut pixmap);

    let mut out = pixmap.data_as_u8_slice().to_vec();
    unpremultiply_rgba8_in_place(&mut out);
    RgbaImage::from_raw(dst.width, dst.height, out)
        .context("rotated pixmap size mismatch")
        .map_err(SnapError::from)
}

fn image_paint(straight_rgba: &[u8], width: u32, height: u32) -> SnapResult<vello_cpu::Image> {
    let (w, h) = canvas_dims(width, height)?;
    if straight_rgba.len() != width as usize * height as usize * 4 {
        return Err(anyhow::anyhow!("image byte length mismatch").into());
    }

    let mut premul = straight_rgba.to_vec();
    premultiply_rgba8_in_place(&mut premul);

    let mut may_have_opacities = false;
    let pixels = premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect::<Vec<_>>();

    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, may_have_opacities);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn canvas_dims(width: u32, height: u32) -> SnapResult<(u16, u16)> {
    let w = u16::try_from(width)
        .map_err(|_| anyhow::anyhow!("canvas width {width} exceeds u16"))?;
    let h = u16::try_from(height)
        .map_err(|_| anyhow::anyhow!("canvas height {height} exceeds u16"))?;
    Ok((w, h))
}

fn full_rect(width: u32, height: u32) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(0.0, 0.0, f64::from(width), f64::from(height))
}

fn cpu_color(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn resolve_color(raw: &str, fallback: Rgba8, what: &str, warnings: &mut Vec<String>) -> Rgba8 {
    match parse_color(raw) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(color = raw, error = %e, "{what} color fallback");
            warnings.push(format!("{what} color: {e}; using default"));
            fallback
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
