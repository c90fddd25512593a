use crate::foundation::core::Rgba8;

const NAMED: &[(&str, Rgba8)] = &[
    ("black", Rgba8::rgb(0, 0, 0)),
    ("white", Rgba8::rgb(255, 255, 255)),
    ("red", Rgba8::rgb(255, 0, 0)),
    ("green", Rgba8::rgb(0, 128, 0)),
    ("lime", Rgba8::rgb(0, 255, 0)),
    ("blue", Rgba8::rgb(0, 0, 255)),
    ("yellow", Rgba8::rgb(255, 255, 0)),
    ("orange", Rgba8::rgb(255, 165, 0)),
    ("cyan", Rgba8::rgb(0, 255, 255)),
    ("magenta", Rgba8::rgb(255, 0, 255)),
    ("gray", Rgba8::rgb(128, 128, 128)),
    ("grey", Rgba8::rgb(128, 128, 128)),
    ("silver", Rgba8::rgb(192, 192, 192)),
    ("navy", Rgba8::rgb(0, 0, 128)),
    (
        "transparent",
        Rgba8 {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        },
    ),
];

/// Parse a user color string.
///
/// Accepts CSS-style names, `#RRGGBB`, `#RRGGBBAA`, `0xRRGGBB` and `rgb(r,g,b)`.
pub(crate) fn parse_color(s: &str) -> Result<Rgba8, String> {
    let s = s.trim();
    if let Some(args) = parse_rgb_fn(s) {
        let [r, g, b] = args?;
        return Ok(Rgba8::rgb(r, g, b));
    }
    if let Some(hex) = s.strip_prefix('#').or_else(|| s.strip_prefix("0x")) {
        return parse_hex(hex);
    }
    let lower = s.to_ascii_lowercase();
    NAMED
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, c)| *c)
        .ok_or_else(|| format!("unknown color \"{s}\""))
}

/// Translate a user color into the syntax ffmpeg filters accept.
///
/// Only `rgb(r,g,b)` needs translating (to `0xRRGGBB`); every other string passes through.
pub(crate) fn ffmpeg_color(s: &str) -> String {
    match parse_rgb_fn(s.trim()) {
        Some(Ok([r, g, b])) => format!("0x{r:02X}{g:02X}{b:02X}"),
        _ => s.to_owned(),
    }
}

fn parse_rgb_fn(s: &str) -> Option<Result<[u8; 3], String>> {
    let inner = s
        .strip_prefix("rgb(")
        .or_else(|| s.strip_prefix("RGB("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Some(Err(format!("rgb() takes 3 components, got \"{s}\"")));
    }
    let mut out = [0u8; 3];
    for (slot, part) in out.iter_mut().zip(&parts) {
        match part.parse::<u8>() {
            Ok(v) => *slot = v,
            Err(_) => return Some(Err(format!("invalid rgb component \"{part}\""))),
        }
    }
    Some(Ok(out))
}

fn parse_hex(s: &str) -> Result<Rgba8, String> {
    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if !s.is_ascii() {
        return Err(format!("invalid hex color \"{s}\""));
    }
    match s.len() {
        6 => Ok(Rgba8::rgb(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
        )),
        8 => Ok(Rgba8 {
            r: hex_byte(&s[0..2])?,
            g: hex_byte(&s[2..4])?,
            b: hex_byte(&s[4..6])?,
            a: hex_byte(&s[6..8])?,
        }),
        _ => Err("hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/color.rs"]
mod tests;
