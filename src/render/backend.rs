use crate::{
    foundation::error::SnapResult,
    geometry::resolve::{CropRect, ResolvedGeometry, Rotation},
    layout::bar::BarPlan,
};

/// An execution engine that can apply resolved geometry and a bar to its native frame
/// representation.
///
/// Geometry and bar resolution happen before any backend call; implementations only translate
/// the resolved values. See [`apply_transforms`] for the fixed call order.
pub trait ImageTransformBackend {
    /// What the backend transforms: decoded pixels, a filter chain, ...
    type Frame;

    /// Rotate clockwise onto a canvas large enough to keep every corner.
    fn rotate(&mut self, frame: Self::Frame, rotation: Rotation) -> SnapResult<Self::Frame>;

    /// Keep only `rect`, given in post-rotation coordinates.
    fn crop(&mut self, frame: Self::Frame, rect: CropRect) -> SnapResult<Self::Frame>;

    /// Paint the bar over the top or bottom band of the frame.
    fn overlay_bar(&mut self, frame: Self::Frame, bar: &BarPlan) -> SnapResult<Self::Frame>;
}

/// Run rotate, crop and bar overlay in that order, skipping the steps the request leaves out.
pub fn apply_transforms<B: ImageTransformBackend>(
    backend: &mut B,
    frame: B::Frame,
    geometry: &ResolvedGeometry,
    bar: Option<&BarPlan>,
) -> SnapResult<B::Frame> {
    let mut frame = frame;
    if !geometry.rotation.is_identity() {
        frame = backend.rotate(frame, geometry.rotation)?;
    }
    if let Some(rect) = geometry.crop {
        frame = backend.crop(frame, rect)?;
    }
    if let Some(bar) = bar {
        frame = backend.overlay_bar(frame, bar)?;
    }
    Ok(frame)
}
