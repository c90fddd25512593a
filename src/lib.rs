//! Snapmark turns a camera still or short clip into an annotated snapshot.
//!
//! A request flows one way through the pipeline:
//!
//! - Fetch a frame (or a stream URI) from a [`FrameSource`]
//! - Resolve rotation, crop and bar parameters into pixels
//! - Rotate, crop and overlay a labeled bar with [`RasterBackend`] (stills) or as an ffmpeg
//!   [`FilterChain`] (clips)
//! - Encode, write atomically, optionally back up, and report a [`SnapshotResult`]
//!
//! Entry point: [`SnapshotPipeline::run`].
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod encode;
pub(crate) mod geometry;
pub(crate) mod host;
pub(crate) mod layout;
pub(crate) mod pipeline;
pub(crate) mod render;
pub(crate) mod request;

pub use crate::foundation::core::Resolution;
pub use crate::foundation::error::{ErrorKind, ParamError, SnapError, SnapResult};

pub use crate::encode::ffmpeg::{EncodeJob, Encoder, FfmpegEncoder, is_tool_on_path};
pub use crate::encode::raster::{OutputFormat, encode_raster};
pub use crate::geometry::resolve::{
    AspectRatio, BarHeightResolution, CropRect, ResolvedGeometry, Rotation, resolve_bar_height,
    resolve_crop, resolve_geometry, resolve_rotation, rotated_bounds,
};
pub use crate::host::fs::{Filesystem, LocalFs, temp_sibling};
pub use crate::host::probe::{FfprobeProbe, NoProbe, Probe};
pub use crate::host::source::{FileSource, FrameSource, StreamSource, source_from_spec};
pub use crate::layout::bar::{
    BarBand, BarLayout, BarPlan, TextAnchor, TextSlot, layout_bar, plan_bar, resolve_font_size,
};
pub use crate::layout::font::{BarFont, FontLoad, TextExtent, TextShaper};
pub use crate::pipeline::orchestrator::{ClipPlan, SnapshotPipeline};
pub use crate::pipeline::result::{ResultError, SnapshotResult, Stage};
pub use crate::render::backend::{ImageTransformBackend, apply_transforms};
pub use crate::render::filter_graph::{
    FilterChain, FilterGraphBackend, FilterStage, VideoPlan, build_filter_chain, escape_drawtext,
    quote_filter_value,
};
pub use crate::render::raster::{CompositeOutput, RasterBackend, composite, decode_still};
pub use crate::request::config::SnapshotConfig;
pub use crate::request::model::{
    BarHeight, BarPosition, BarSpec, FontSize, MediaKind, SnapshotParams, SnapshotRequest,
};
