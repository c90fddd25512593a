use super::*;

#[test]
fn mul_div255_rounds() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(128, 255), 128);
    assert_eq!(mul_div255_u16(255, 0), 0);
}

#[test]
fn premul_roundtrip_is_identity_for_opaque() {
    let mut px = vec![10u8, 20, 30, 255];
    premultiply_rgba8_in_place(&mut px);
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![10, 20, 30, 255]);
}

#[test]
fn premul_zero_alpha_clears_rgb() {
    let mut px = vec![200u8, 100, 50, 0];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![0, 0, 0, 0]);
}

#[test]
fn half_alpha_survives_roundtrip_within_one() {
    let mut px = vec![200u8, 100, 50, 128];
    premultiply_rgba8_in_place(&mut px);
    unpremultiply_rgba8_in_place(&mut px);
    assert!(px[0].abs_diff(200) <= 1);
    assert!(px[1].abs_diff(100) <= 1);
    assert!(px[2].abs_diff(50) <= 1);
    assert_eq!(px[3], 128);
}
