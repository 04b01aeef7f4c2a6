use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    core::Fps,
    error::{OsdError, OsdResult},
    playback::FrameSink,
    render_svg::{FrameRGBA, unpremultiply_rgba8},
};

#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    pub out_path: PathBuf,
    pub overwrite: bool,
}

impl EncodeConfig {
    pub fn validate(&self) -> OsdResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(OsdError::validation(
                "encode width/height must be non-zero",
            ));
        }
        Ok(())
    }

    pub fn with_out_path(mut self, out_path: impl Into<PathBuf>) -> Self {
        self.out_path = out_path.into();
        self
    }
}

/// QuickTime container with the lossless `png` codec: the one widely
/// supported combination that keeps the alpha channel intact.
pub fn default_mov_config(
    out_path: impl Into<PathBuf>,
    width: u32,
    height: u32,
    fps: Fps,
) -> EncodeConfig {
    EncodeConfig {
        width,
        height,
        fps,
        out_path: out_path.into(),
        overwrite: true,
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> OsdResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Pipes straight-alpha RGBA frames into a spawned `ffmpeg` process.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    scratch: Vec<u8>,
}

impl FfmpegEncoder {
    pub fn new(cfg: EncodeConfig) -> OsdResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(OsdError::validation(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(OsdError::encode(
                "ffmpeg is required for video export, but was not found on PATH",
            ));
        }

        // The system binary keeps us off native FFmpeg dev headers/libs.
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if cfg.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        let fps_arg = format!("{}/{}", cfg.fps.num, cfg.fps.den);
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &fps_arg,
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "png",
            "-pix_fmt",
            "rgba",
            "-r",
            &fps_arg,
        ])
        .arg(&cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            OsdError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| OsdError::encode("failed to open ffmpeg stdin (unexpected)"))?;

        Ok(Self {
            scratch: vec![0u8; (cfg.width * cfg.height * 4) as usize],
            cfg,
            child: Some(child),
            stdin: Some(stdin),
        })
    }

    pub fn encode_frame(&mut self, frame: &FrameRGBA) -> OsdResult<()> {
        if frame.width != self.cfg.width || frame.height != self.cfg.height {
            return Err(OsdError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.cfg.width, self.cfg.height
            )));
        }

        if frame.data.len() != self.scratch.len() {
            return Err(OsdError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        if frame.premultiplied {
            unpremultiply_rgba8(&mut self.scratch, &frame.data);
        } else {
            self.scratch.copy_from_slice(&frame.data);
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(OsdError::encode("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin
            .write_all(&self.scratch)
            .map_err(|e| OsdError::encode(format!("failed to write frame to ffmpeg stdin: {e}")))?;

        Ok(())
    }

    pub fn finalize(&mut self) -> OsdResult<()> {
        drop(self.stdin.take());

        let Some(child) = self.child.take() else {
            return Err(OsdError::encode("ffmpeg encoder is already finalized"));
        };

        let output = child
            .wait_with_output()
            .map_err(|e| OsdError::encode(format!("failed to wait for ffmpeg to finish: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OsdError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

impl FrameSink for FfmpegEncoder {
    fn write_frame(&mut self, frame: &FrameRGBA) -> OsdResult<()> {
        self.encode_frame(frame)
    }

    fn finish(&mut self) -> OsdResult<()> {
        self.finalize()
    }
}
