use super::*;

#[test]
fn unknown_chars_fall_back_to_question_mark() {
    assert_eq!(glyph('ä'), glyph('?'));
    assert_eq!(glyph('\n'), glyph('?'));
    assert_ne!(glyph('A'), glyph('?'));
}

#[test]
fn extent_scales_linearly() {
    assert_eq!(extent("", 3), (0, 0));
    assert_eq!(extent("A", 1), (5, 8));
    assert_eq!(extent("AB", 2), (22, 16));
}

#[test]
fn lit_cells_stay_inside_extent() {
    let (w, h) = extent("Hello, 42!", 2);
    for (x, y) in lit_cells("Hello, 42!", 2) {
        assert!(x + 2 <= w && y + 2 <= h, "({x},{y}) outside {w}x{h}");
    }
}

#[test]
fn space_has_no_lit_cells() {
    assert_eq!(lit_cells("   ", 4).count(), 0);
}

#[test]
fn scale_tracks_font_size() {
    assert_eq!(scale_for(10), 1);
    assert_eq!(scale_for(20), 3);
    assert_eq!(scale_for(40), 5);
}
