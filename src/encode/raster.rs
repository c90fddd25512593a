use std::{io::Cursor, path::Path};

use image::RgbaImage;

use crate::foundation::error::{SnapError, SnapResult};

/// Raster container chosen from the destination's extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    /// `png` selects PNG; `jpg`, `jpeg` and anything unrecognized select JPEG.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("png") => Self::Png,
            _ => Self::Jpeg,
        }
    }
}

/// Encode `img` fully in memory.
///
/// JPEG has no alpha channel, so the image is flattened to RGB first.
pub fn encode_raster(img: &RgbaImage, format: OutputFormat, jpeg_quality: u8) -> SnapResult<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        OutputFormat::Png => img
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| SnapError::encode(format!("png: {e}")))?,
        OutputFormat::Jpeg => {
            let rgb = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, jpeg_quality)
                .encode_image(&rgb)
                .map_err(|e| SnapError::encode(format!("jpeg: {e}")))?;
        }
    }
    Ok(buf)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/raster.rs"]
mod tests;
