pub(crate) mod bar;
pub(crate) mod font;
pub(crate) mod glyphs;
