use std::{
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    encode::{
        ffmpeg::{EncodeJob, Encoder, FfmpegEncoder},
        raster::{OutputFormat, encode_raster},
    },
    foundation::{
        core::Resolution,
        error::{ErrorKind, SnapError, SnapResult},
    },
    geometry::resolve::resolve_geometry,
    host::{
        fs::{Filesystem, LocalFs, temp_sibling},
        probe::{FfprobeProbe, Probe},
    },
    layout::{
        bar::{BarPlan, plan_bar},
        font::{BarFont, TextShaper},
    },
    pipeline::result::{ResultError, SnapshotResult, Stage},
    render::{
        filter_graph::{VideoPlan, build_filter_chain},
        raster::{RasterBackend, composite, decode_still},
    },
    request::{
        config::SnapshotConfig,
        model::{MediaKind, SnapshotParams, SnapshotRequest},
    },
};

/// Runs snapshot requests against injected collaborators.
///
/// Holds no per-request state; one pipeline may serve concurrent callers. Two requests that
/// target the same output path race, and the last writer wins.
pub struct SnapshotPipeline {
    config: SnapshotConfig,
    encoder: Arc<dyn Encoder>,
    probe: Arc<dyn Probe>,
    fs: Arc<dyn Filesystem>,
}

impl SnapshotPipeline {
    /// Pipeline using the system `ffmpeg`/`ffprobe` and the local disk.
    pub fn new(config: SnapshotConfig) -> Self {
        Self {
            config,
            encoder: Arc::new(FfmpegEncoder::new()),
            probe: Arc::new(FfprobeProbe),
            fs: Arc::new(LocalFs),
        }
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn Probe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_fs(mut self, fs: Arc<dyn Filesystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// Process one request. Never panics and never returns an error: every failure is
    /// described by the returned [`SnapshotResult`].
    #[tracing::instrument(
        skip_all,
        fields(source = %request.source.describe(), destination = %request.params.destination.display())
    )]
    pub fn run(&self, request: &SnapshotRequest) -> SnapshotResult {
        let mut run = RunState::default();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.execute(request, &mut run)));
        let error = match outcome {
            Ok(Ok(())) => {
                run.enter(Stage::Done);
                None
            }
            Ok(Err(err)) => {
                tracing::warn!(stage = ?run.stage, kind = ?err.kind(), error = %err, "snapshot failed");
                Some(ResultError::from_error(&err, run.stage))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(stage = ?run.stage, %message, "snapshot panicked");
                Some(ResultError {
                    kind: ErrorKind::Internal,
                    message: format!("internal error: {message}"),
                    stage: run.stage,
                })
            }
        };

        let mut result = run.result;
        result.success = error.is_none();
        result.error = error;
        result
    }

    fn execute(&self, request: &SnapshotRequest, run: &mut RunState) -> SnapResult<()> {
        let params = &request.params;
        let destination = self.config.resolve_destination(&params.destination);

        match params.media {
            MediaKind::Still => self.run_still(request, &destination, run)?,
            MediaKind::Video { duration_secs } => {
                self.run_video(request, &destination, duration_secs, run)?
            }
        }

        if let Some(backup) = params.backup_destination.as_deref() {
            let backup = self.config.resolve_backup(backup);
            run.enter(Stage::Backup);
            run.result.backup_path = Some(backup.clone());
            self.fs.copy_file(&destination, &backup).map_err(|e| {
                let detail = match e {
                    SnapError::WriteFailed(msg) => msg,
                    other => other.to_string(),
                };
                SnapError::backup_failed(detail)
            })?;
            tracing::info!(backup = %backup.display(), "backup written");
        }
        Ok(())
    }

    fn run_still(
        &self,
        request: &SnapshotRequest,
        destination: &Path,
        run: &mut RunState,
    ) -> SnapResult<()> {
        let params = &request.params;

        run.enter(Stage::Fetching);
        let bytes = request.source.fetch_still()?;
        let frame = decode_still(&bytes)?;
        let original = Resolution::new(frame.width(), frame.height());
        run.result.original_resolution = Some(original);

        run.enter(Stage::Validating);
        let geometry = resolve_geometry(Some(original), params)?;
        let bar = self.plan_bar(params, geometry.output(), run);

        run.enter(Stage::Transforming);
        let (font, shaper) = self.load_font(params, bar.as_ref(), run);
        let mut backend =
            RasterBackend::new(&self.config.rotate_fill_color, font).with_shaper(shaper);
        let out = composite(frame, &geometry, bar.as_ref(), &mut backend)?;
        run.result.warnings.extend(backend.take_warnings());
        run.result.final_resolution = Some(out.final_resolution);

        run.enter(Stage::Encoding);
        let format = OutputFormat::from_path(destination);
        let encoded = encode_raster(&out.image, format, self.config.jpeg_quality)?;

        run.enter(Stage::Writing);
        self.fs.write_bytes(destination, &encoded)?;
        run.result.output_path = Some(destination.to_path_buf());
        tracing::info!(
            output = %destination.display(),
            format = ?format,
            resolution = %out.final_resolution,
            "snapshot written"
        );
        Ok(())
    }

    /// Plan the filter chain a clip request would be encoded with, without encoding.
    pub fn plan_clip(&self, request: &SnapshotRequest) -> SnapResult<ClipPlan> {
        let mut run = RunState::default();
        let (input_uri, video) = self.prepare_clip(request, &mut run)?;
        Ok(ClipPlan {
            input_uri,
            video,
            original_resolution: run.result.original_resolution,
            warnings: run.result.warnings,
        })
    }

    /// Fetch the stream URI and turn the request into a filter chain.
    fn prepare_clip(
        &self,
        request: &SnapshotRequest,
        run: &mut RunState,
    ) -> SnapResult<(String, VideoPlan)> {
        let params = &request.params;

        run.enter(Stage::Fetching);
        let uri = request.source.fetch_stream_uri()?;
        let source = self.probe.inspect(&uri);
        if source.is_none() {
            run.warn(format!(
                "frame size of '{}' unknown; crop bounds are left to the encoder",
                request.source.describe()
            ));
        }
        run.result.original_resolution = source;

        run.enter(Stage::Validating);
        let geometry = resolve_geometry(source, params)?;
        let bar = self.plan_bar(params, geometry.output(), run);

        run.enter(Stage::Transforming);
        let (font, _) = self.load_font(params, bar.as_ref(), run);
        let plan = build_filter_chain(
            source,
            &geometry,
            bar.as_ref(),
            &self.config.rotate_fill_color,
            &font,
        )?;
        Ok((uri, plan))
    }

    fn run_video(
        &self,
        request: &SnapshotRequest,
        destination: &Path,
        duration_secs: u32,
        run: &mut RunState,
    ) -> SnapResult<()> {
        let (uri, plan) = self.prepare_clip(request, run)?;
        run.result.final_resolution = plan.final_resolution;

        let duration = self.config.clamp_duration(duration_secs);
        if duration != duration_secs {
            run.warn(format!(
                "clip duration {duration_secs}s outside 1..={}s; using {duration}s",
                self.config.max_video_duration_secs
            ));
        }

        run.enter(Stage::Encoding);
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs.ensure_directory(parent)?;
        }
        let temp = temp_sibling(destination);
        let job = EncodeJob {
            input_uri: uri,
            output_path: temp.clone(),
            filter_chain: plan.chain,
            duration_secs: duration,
            timeout: self.config.encode_timeout(),
        };
        if let Err(e) = self.encoder.encode(&job) {
            self.fs.discard(&temp);
            return Err(e);
        }

        run.enter(Stage::Writing);
        self.fs.persist(&temp, destination)?;
        run.result.output_path = Some(destination.to_path_buf());
        tracing::info!(output = %destination.display(), duration_s = duration, "clip written");
        Ok(())
    }

    fn plan_bar(
        &self,
        params: &SnapshotParams,
        frame: Option<Resolution>,
        run: &mut RunState,
    ) -> Option<BarPlan> {
        let spec = params.bar.as_ref()?;
        let (plan, warnings) = plan_bar(
            spec,
            frame.map(|f| f.height),
            self.config.default_bar_height_px,
        );
        for w in warnings {
            run.warn(w);
        }
        Some(plan)
    }

    fn load_font(
        &self,
        params: &SnapshotParams,
        bar: Option<&BarPlan>,
        run: &mut RunState,
    ) -> (BarFont, TextShaper) {
        let mut shaper = TextShaper::new();
        let wants_text = bar.is_some_and(|b| !b.slots.is_empty());
        if !wants_text {
            return (BarFont::Builtin, shaper);
        }

        let requested: Option<PathBuf> = params
            .bar
            .as_ref()
            .and_then(|b| b.font_path.as_deref())
            .map(|p| self.config.resolve_font(p));
        let fallback: Option<PathBuf> = self
            .config
            .default_font_path
            .as_deref()
            .map(|p| self.config.resolve_font(p));

        let load = BarFont::load(requested.as_deref(), fallback.as_deref(), &mut shaper);
        if let Some(w) = load.warning {
            run.warn(w);
        }
        (load.font, shaper)
    }
}

/// A clip request resolved down to its encoder input.
#[derive(Clone, Debug)]
pub struct ClipPlan {
    pub input_uri: String,
    pub video: VideoPlan,
    /// Probed source size, when available.
    pub original_resolution: Option<Resolution>,
    pub warnings: Vec<String>,
}

#[derive(Default)]
struct RunState {
    stage: Stage,
    result: SnapshotResult,
}

impl RunState {
    fn enter(&mut self, stage: Stage) {
        tracing::debug!(from = ?self.stage, to = ?stage, "stage");
        self.stage = stage;
    }

    fn warn(&mut self, warning: String) {
        tracing::warn!(%warning, "non-fatal");
        self.result.warnings.push(warning);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/orchestrator.rs"]
mod tests;
