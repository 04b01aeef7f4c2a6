use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use telemetry_osd::{
    CalibrationParams, CorrectedSeries, ExtractWindow, FfmpegEncoder, Fps, LabelFormat,
    PlaybackConfig, PngPreviewSink, RenderSettings, RowReader, SvgRenderer, Viewport,
    default_mov_config, extract_series,
};

#[derive(Parser, Debug)]
#[command(name = "telemetry-osd", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single preview frame as a PNG.
    Frame(FrameArgs),
    /// Export the animated overlay as a transparent video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Input CSV log.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Name of the telemetry column to plot.
    #[arg(long)]
    field: String,

    /// Start offset into the log, in seconds of elapsed time.
    #[arg(long)]
    start: f64,

    /// Length of the data window, in seconds.
    #[arg(long)]
    duration: f64,

    /// Frames per second.
    #[arg(long, default_value_t = 25)]
    fps: u32,

    /// Output density in dots per inch.
    #[arg(long, default_value_t = 192.0)]
    dpi: f64,

    /// Calibration constants JSON; identity transforms when omitted.
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// Unit suffix for the value label.
    #[arg(long, default_value = "m")]
    unit: String,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Elapsed-time offset of the previewed frame, in seconds from the window start.
    #[arg(long)]
    at: f64,

    /// Output PNG path.
    #[arg(long, default_value = "preview.png")]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output duration in seconds; defaults to the data window duration.
    #[arg(long)]
    out_duration: Option<f64>,

    /// Output video path.
    #[arg(long, default_value = "movie.mov")]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

struct Prepared {
    series: CorrectedSeries,
    renderer: SvgRenderer,
    cfg: PlaybackConfig,
}

fn prepare(source: &SourceArgs) -> anyhow::Result<Prepared> {
    // Calibration is checked before any sample is touched.
    let calibration = match &source.calibration {
        Some(path) => CalibrationParams::from_json_path(path)?,
        None => CalibrationParams::default(),
    };
    calibration.validate()?;

    let window = ExtractWindow {
        start: source.start,
        duration: source.duration,
    };
    let rows = RowReader::from_path(&source.in_path)
        .with_context(|| format!("open csv '{}'", source.in_path.display()))?;
    let raw = extract_series(rows, &source.field, window)?;
    let series = calibration.apply(&raw)?;

    let settings = RenderSettings {
        dpi: source.dpi,
        ..RenderSettings::default()
    };
    let viewport = Viewport::fit(&series, settings.margin);
    let renderer = SvgRenderer::new(settings, viewport)?;

    let cfg = PlaybackConfig {
        fps: Fps::new(source.fps, 1)?,
        start: source.start,
        out_duration: source.duration,
        label: LabelFormat {
            unit: source.unit.clone(),
            ..LabelFormat::default()
        },
    };

    Ok(Prepared {
        series,
        renderer,
        cfg,
    })
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let prepared = prepare(&args.source)?;
    let mut sink = PngPreviewSink::new(&args.out);
    let index = telemetry_osd::preview(
        &prepared.series,
        &prepared.cfg,
        &prepared.renderer,
        &mut sink,
        args.at,
    )?;
    eprintln!("wrote {} (frame {})", args.out.display(), index.0);
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let prepared = prepare(&args.source)?;
    let cfg = PlaybackConfig {
        out_duration: args.out_duration.unwrap_or(args.source.duration),
        ..prepared.cfg
    };

    let canvas = prepared.renderer.canvas();
    let mut encoder = FfmpegEncoder::new(default_mov_config(
        &args.out,
        canvas.width,
        canvas.height,
        cfg.fps,
    ))?;

    let frames = telemetry_osd::export(&prepared.series, &cfg, &prepared.renderer, &mut encoder)?;
    eprintln!("wrote {} ({} frames)", args.out.display(), frames);
    Ok(())
}
