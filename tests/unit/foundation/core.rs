use super::*;

#[test]
fn transposed_swaps_axes() {
    assert_eq!(Resolution::new(100, 200).transposed(), Resolution::new(200, 100));
}

#[test]
fn display_is_w_by_h() {
    assert_eq!(Resolution::new(640, 480).to_string(), "640x480");
}
