use std::path::PathBuf;

use anyhow::Context as _;

use crate::{
    core::{Fps, FrameIndex},
    error::{OsdError, OsdResult},
    frame::{FrameState, LabelFormat, frame_state},
    render_svg::{FrameRGBA, SvgRenderer},
    series::CorrectedSeries,
};

/// Consumes rendered frames in strictly increasing time order.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &FrameRGBA) -> OsdResult<()>;
    fn finish(&mut self) -> OsdResult<()>;
}

#[derive(Clone, Debug)]
pub struct PlaybackConfig {
    pub fps: Fps,
    /// Elapsed-time offset of frame 0, same value the extraction window used.
    pub start: f64,
    /// Length of the exported animation in seconds.
    pub out_duration: f64,
    pub label: LabelFormat,
}

/// Renders the full frame sequence `0 .. floor(fps * out_duration)` and feeds
/// it to `sink` in order, then finalizes the sink. Returns the frame count.
#[tracing::instrument(skip_all, fields(fps = cfg.fps.as_f64(), out_duration = cfg.out_duration))]
pub fn export(
    series: &CorrectedSeries,
    cfg: &PlaybackConfig,
    renderer: &SvgRenderer,
    sink: &mut dyn FrameSink,
) -> OsdResult<u64> {
    let total = cfg.fps.secs_to_frames_floor(cfg.out_duration);
    if total == 0 {
        return Err(OsdError::validation(
            "output duration is shorter than one frame",
        ));
    }

    for i in 0..total {
        let state = compute_frame(series, cfg, FrameIndex(i));
        let frame = renderer.render(&state)?;
        sink.write_frame(&frame)?;
        if i % 100 == 0 {
            tracing::debug!(frame = i, total, "encoding");
        }
    }

    sink.finish()?;
    tracing::info!(frames = total, "export complete");
    Ok(total)
}

/// Renders the single frame nearest to elapsed offset `at` and hands it to
/// the preview sink. Returns the chosen frame index.
pub fn preview(
    series: &CorrectedSeries,
    cfg: &PlaybackConfig,
    renderer: &SvgRenderer,
    sink: &mut dyn FrameSink,
    at: f64,
) -> OsdResult<FrameIndex> {
    let index = FrameIndex(cfg.fps.secs_to_frames_floor(at));
    let state = compute_frame(series, cfg, index);
    let frame = renderer.render(&state)?;
    sink.write_frame(&frame)?;
    sink.finish()?;
    Ok(index)
}

fn compute_frame(series: &CorrectedSeries, cfg: &PlaybackConfig, index: FrameIndex) -> FrameState {
    frame_state(series, index, cfg.fps, cfg.start, &cfg.label)
}

/// Preview sink writing a single PNG with straight alpha.
pub struct PngPreviewSink {
    out_path: PathBuf,
}

impl PngPreviewSink {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
        }
    }
}

impl FrameSink for PngPreviewSink {
    fn write_frame(&mut self, frame: &FrameRGBA) -> OsdResult<()> {
        if let Some(parent) = self.out_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        image::save_buffer_with_format(
            &self.out_path,
            &frame.to_straight_alpha(),
            frame.width,
            frame.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .map_err(|e| {
            OsdError::render(format!("write png '{}': {e}", self.out_path.display()))
        })?;
        Ok(())
    }

    fn finish(&mut self) -> OsdResult<()> {
        Ok(())
    }
}
