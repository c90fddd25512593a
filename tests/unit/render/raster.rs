use super::*;
use crate::{
    geometry::resolve::{resolve_geometry, resolve_rotation},
    layout::bar::plan_bar,
    request::model::{BarHeight, BarPosition, BarSpec, SnapshotParams},
};

fn gradient(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| image::Rgba([(x % 256) as u8, (y % 256) as u8, 7, 255]))
}

fn backend() -> RasterBackend {
    RasterBackend::new("black", BarFont::Builtin)
}

#[test]
fn quarter_turn_transposes_exactly() {
    let src = gradient(100, 200);
    let out = backend().rotate(src.clone(), resolve_rotation(90).unwrap()).unwrap();
    assert_eq!(out.dimensions(), (200, 100));
    // Clockwise: the source's bottom-left pixel lands top-left.
    assert_eq!(out.get_pixel(0, 0), src.get_pixel(0, 199));
    assert_eq!(out.get_pixel(199, 0), src.get_pixel(0, 0));
}

#[test]
fn arbitrary_angle_expands_and_fills_corners() {
    let src = RgbaImage::from_pixel(40, 40, image::Rgba([255, 255, 255, 255]));
    let out = backend().rotate(src, resolve_rotation(45).unwrap()).unwrap();
    assert_eq!(out.dimensions(), (57, 57));
    // Corners of the expanded canvas are outside the rotated square.
    assert_eq!(out.get_pixel(0, 0), &image::Rgba([0, 0, 0, 255]));
    let center = out.get_pixel(28, 28);
    assert!(center.0.iter().all(|&c| c >= 250), "{center:?}");
}

#[test]
fn crop_produces_requested_size() {
    let src = gradient(64, 48);
    for (x, y, w, h) in [(0, 0, 64, 48), (5, 6, 10, 12), (63, 47, 1, 1)] {
        let rect = CropRect {
            x,
            y,
            width: w,
            height: h,
        };
        let out = backend().crop(src.clone(), rect).unwrap();
        assert_eq!(out.dimensions(), (w, h));
        assert_eq!(out.get_pixel(0, 0), src.get_pixel(x, y));
    }
}

#[test]
fn crop_outside_frame_is_rejected() {
    let rect = CropRect {
        x: 60,
        y: 0,
        width: 10,
        height: 10,
    };
    let err = backend().crop(gradient(64, 48), rect).unwrap_err();
    assert!(matches!(
        err,
        SnapError::InvalidParameter(ParamError::CropOutOfBounds { .. })
    ));
}

#[test]
fn bar_paints_band_only() {
    let spec = BarSpec {
        position: BarPosition::Bottom,
        height: Some(BarHeight::Pixels(20)),
        bar_color: "rgb(0,0,255)".to_owned(),
        ..BarSpec::default()
    };
    let (plan, _) = plan_bar(&spec, Some(60), 40);
    let src = gradient(80, 60);
    let out = backend().overlay_bar(src.clone(), &plan).unwrap();

    assert_eq!(out.dimensions(), (80, 60));
    assert_eq!(out.get_pixel(3, 39), src.get_pixel(3, 39));
    assert_eq!(out.get_pixel(3, 40), &image::Rgba([0, 0, 255, 255]));
    assert_eq!(out.get_pixel(79, 59), &image::Rgba([0, 0, 255, 255]));
}

#[test]
fn bar_text_uses_font_color() {
    let spec = BarSpec {
        position: BarPosition::Top,
        height: Some(BarHeight::Pixels(20)),
        bar_color: "white".to_owned(),
        font_color: "red".to_owned(),
        text_left: "HHHH".to_owned(),
        ..BarSpec::default()
    };
    let (plan, _) = plan_bar(&spec, Some(60), 40);
    let out = backend().overlay_bar(gradient(120, 60), &plan).unwrap();

    let band_pixels = (0..20).flat_map(|y| (0..120).map(move |x| (x, y)));
    let red = band_pixels
        .filter(|&(x, y)| out.get_pixel(x, y) == &image::Rgba([255, 0, 0, 255]))
        .count();
    assert!(red > 0);
}

#[test]
fn unknown_bar_color_warns_and_uses_default() {
    let spec = BarSpec {
        height: Some(BarHeight::Pixels(10)),
        bar_color: "not-a-color".to_owned(),
        ..BarSpec::default()
    };
    let (plan, _) = plan_bar(&spec, Some(30), 40);
    let mut backend = backend();
    let out = backend.overlay_bar(gradient(30, 30), &plan).unwrap();
    assert_eq!(out.get_pixel(0, 29), &image::Rgba([255, 255, 255, 255]));
    let warnings = backend.take_warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("not-a-color"));
}

#[test]
fn composite_reports_both_resolutions() {
    let mut params = SnapshotParams::new("out.png");
    params.rotate_angle = 90;
    params.crop = Some(vec![10, 10, 50, 40]);
    let geometry = resolve_geometry(Some(Resolution::new(100, 200)), &params).unwrap();

    let out = composite(gradient(100, 200), &geometry, None, &mut backend()).unwrap();
    assert_eq!(out.original_resolution, Resolution::new(100, 200));
    assert_eq!(out.final_resolution, Resolution::new(50, 40));
    assert_eq!(out.image.dimensions(), (50, 40));
}

#[test]
fn decode_rejects_garbage() {
    let err = decode_still(b"nope").unwrap_err();
    assert!(matches!(err, SnapError::SourceUnavailable(_)));
}
