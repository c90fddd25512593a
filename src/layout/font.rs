use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    foundation::error::{SnapError, SnapResult},
    layout::glyphs,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color carried through Parley layouts.
pub struct TextBrushRgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

/// The face used to draw bar text.
#[derive(Clone)]
pub enum BarFont {
    /// A TrueType/OpenType file read from disk.
    Outline {
        /// Where the bytes came from.
        path: PathBuf,
        /// Raw font file.
        bytes: Arc<Vec<u8>>,
    },
    /// The built-in bitmap glyph set.
    Builtin,
}

impl std::fmt::Debug for BarFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outline { path, bytes } => f
                .debug_struct("Outline")
                .field("path", path)
                .field("bytes_len", &bytes.len())
                .finish(),
            Self::Builtin => f.write_str("Builtin"),
        }
    }
}

/// Result of resolving a font request, with the reason when a fallback was taken.
#[derive(Clone, Debug)]
pub struct FontLoad {
    /// Face to draw with.
    pub font: BarFont,
    /// Set when the requested font could not be used.
    pub warning: Option<String>,
}

impl BarFont {
    /// Load `requested`, falling back to `fallback` and then to the built-in glyphs.
    ///
    /// Never fails: an unusable requested font becomes a warning naming its path.
    pub fn load(
        requested: Option<&Path>,
        fallback: Option<&Path>,
        shaper: &mut TextShaper,
    ) -> FontLoad {
        let mut warning = None;

        if let Some(path) = requested {
            match Self::read_outline(path, shaper) {
                Ok(font) => return FontLoad { font, warning },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "font fallback");
                    warning = Some(e.to_string());
                }
            }
        }

        if let Some(path) = fallback.filter(|p| Some(*p) != requested) {
            match Self::read_outline(path, shaper) {
                Ok(font) => {
                    let warning = warning.map(|w| format!("{w}; using '{}'", path.display()));
                    return FontLoad { font, warning };
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "default font unusable");
                    if warning.is_none() && requested.is_none() {
                        warning = Some(e.to_string());
                    }
                }
            }
        }

        FontLoad {
            font: Self::Builtin,
            warning: warning.map(|w| format!("{w}; using built-in font")),
        }
    }

    /// Path of the font file, `None` for the built-in glyphs.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Outline { path, .. } => Some(path),
            Self::Builtin => None,
        }
    }

    fn read_outline(path: &Path, shaper: &mut TextShaper) -> SnapResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            SnapError::font_unavailable(format!("cannot read font '{}': {e}", path.display()))
        })?;
        let bytes = Arc::new(bytes);
        shaper.register(path, &bytes)?;
        Ok(Self::Outline {
            path: path.to_path_buf(),
            bytes,
        })
    }
}

/// Pixel extent of a shaped string.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextExtent {
    /// Advance width.
    pub width: f32,
    /// Line height (ascent + descent + leading).
    pub height: f32,
}

/// Stateful helper for shaping bar labels with Parley.
pub struct TextShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    families: HashMap<PathBuf, String>,
}

impl Default for TextShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl TextShaper {
    /// Construct a shaper with fresh Parley contexts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    fn register(&mut self, path: &Path, font_bytes: &[u8]) -> SnapResult<String> {
        if let Some(name) = self.families.get(path) {
            return Ok(name.clone());
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            SnapError::font_unavailable(format!(
                "'{}' contains no usable font faces",
                path.display()
            ))
        })?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| {
                SnapError::font_unavailable(format!(
                    "font family in '{}' has no name",
                    path.display()
                ))
            })?
            .to_string();

        self.families
            .insert(path.to_path_buf(), family_name.clone());
        Ok(family_name)
    }

    /// Shape a single line of `text` in the family registered for `path`.
    pub(crate) fn shape(
        &mut self,
        path: &Path,
        font_bytes: &[u8],
        text: &str,
        size_px: f32,
    ) -> SnapResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(anyhow::anyhow!("text size_px must be finite and > 0").into());
        }
        let family_name = self.register(path, font_bytes)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// Width and line height of a shaped layout.
pub(crate) fn layout_extent(layout: &parley::Layout<TextBrushRgba8>) -> TextExtent {
    let mut width = 0.0f32;
    let mut height = 0.0f32;
    for line in layout.lines() {
        let m = line.metrics();
        width = width.max(m.advance);
        height += m.ascent + m.descent + m.leading;
    }
    TextExtent { width, height }
}

/// Extent of `text` drawn with the built-in glyphs at `size_px`.
pub(crate) fn builtin_extent(text: &str, size_px: u32) -> TextExtent {
    let (w, h) = glyphs::extent(text, glyphs::scale_for(size_px));
    TextExtent {
        width: w as f32,
        height: h as f32,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/font.rs"]
mod tests;
