#![forbid(unsafe_code)]

pub mod calib;
pub mod core;
pub mod encode_ffmpeg;
pub mod error;
pub mod extract;
pub mod frame;
pub mod interp;
pub mod playback;
pub mod render_svg;
pub mod rows;
pub mod series;

pub use calib::{CalibrationParams, TimeCorrection, ValueCorrection};
pub use self::core::{Canvas, Fps, FrameIndex};
pub use encode_ffmpeg::{EncodeConfig, FfmpegEncoder, default_mov_config, is_ffmpeg_on_path};
pub use error::{OsdError, OsdResult};
pub use extract::{ExtractWindow, RawSample, extract_series};
pub use frame::{FrameState, LabelFormat, frame_state};
pub use interp::{Interpolated, sample_at};
pub use playback::{FrameSink, PlaybackConfig, PngPreviewSink, export, preview};
pub use render_svg::{FrameRGBA, RenderSettings, SvgRenderer, Viewport};
pub use rows::{Row, RowReader};
pub use series::{CorrectedSeries, SamplePoint};
