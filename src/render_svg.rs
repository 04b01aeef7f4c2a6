use std::fmt::Write as _;

use crate::{
    core::Canvas,
    error::{OsdError, OsdResult},
    frame::FrameState,
    series::CorrectedSeries,
};

/// A rasterized frame, RGBA8.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Returns the pixel data with straight (non-premultiplied) alpha, as
    /// expected by PNG writers and ffmpeg's `rgba` raw input.
    pub fn to_straight_alpha(&self) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        let mut out = vec![0u8; self.data.len()];
        unpremultiply_rgba8(&mut out, &self.data);
        out
    }
}

pub(crate) fn unpremultiply_rgba8(dst: &mut [u8], src: &[u8]) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = s[3] as u16;
        match a {
            0 => d.copy_from_slice(&[0, 0, 0, 0]),
            255 => d.copy_from_slice(s),
            _ => {
                for i in 0..3 {
                    d[i] = (((s[i] as u16) * 255 + a / 2) / a).min(255) as u8;
                }
                d[3] = s[3];
            }
        }
    }
}

/// Data-space window mapped onto the canvas; fixed once per run so the
/// visible time axis is stable across the whole export.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub t_min: f64,
    pub t_max: f64,
    pub v_min: f64,
    pub v_max: f64,
    /// Fraction of each data span padded on both sides.
    pub margin: f64,
}

impl Viewport {
    pub fn fit(series: &CorrectedSeries, margin: f64) -> Self {
        let (t_min, t_max) = series.time_bounds();
        let (v_min, v_max) = series.value_bounds();
        Self {
            t_min,
            t_max,
            v_min,
            v_max,
            margin,
        }
    }

    /// Maps a data point to pixel coordinates (y grows downward).
    pub fn project(&self, canvas: Canvas, t: f64, v: f64) -> (f64, f64) {
        fn axis(lo: f64, hi: f64, margin: f64, value: f64) -> f64 {
            let span = if hi > lo { hi - lo } else { 1.0 };
            let pad = span * margin;
            (value - (lo - pad)) / (span + 2.0 * pad)
        }

        let x = axis(self.t_min, self.t_max, self.margin, t) * f64::from(canvas.width);
        let y = (1.0 - axis(self.v_min, self.v_max, self.margin, v)) * f64::from(canvas.height);
        (x, y)
    }
}

/// Visual parameters of the overlay; lengths are in points (1/72 in), scaled
/// by `dpi` at raster time.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RenderSettings {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: f64,
    pub color: String,
    pub line_width: f64,
    pub marker_radius: f64,
    pub font_size: f64,
    pub label_offset: (f64, f64),
    pub margin: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width_in: 10.0,
            height_in: 2.0,
            dpi: 192.0,
            color: "red".to_string(),
            line_width: 2.0,
            marker_radius: 4.0,
            font_size: 25.0,
            label_offset: (10.0, 0.0),
            margin: 0.2,
        }
    }
}

impl RenderSettings {
    pub fn validate(&self) -> OsdResult<()> {
        if !(self.width_in > 0.0 && self.height_in > 0.0) {
            return Err(OsdError::validation("figure width/height must be > 0"));
        }
        if !(self.dpi > 0.0 && self.dpi.is_finite()) {
            return Err(OsdError::validation("dpi must be a positive finite number"));
        }
        if !(self.font_size > 0.0) {
            return Err(OsdError::validation("font size must be > 0"));
        }
        Ok(())
    }
}

/// Rasterizes [`FrameState`]s by building a per-frame SVG scene and rendering
/// it onto a transparent pixmap.
pub struct SvgRenderer {
    settings: RenderSettings,
    viewport: Viewport,
    canvas: Canvas,
    options: usvg::Options<'static>,
}

impl SvgRenderer {
    pub fn new(settings: RenderSettings, viewport: Viewport) -> OsdResult<Self> {
        settings.validate()?;
        let canvas = Canvas {
            width: (settings.width_in * settings.dpi).round().max(1.0) as u32,
            height: (settings.height_in * settings.dpi).round().max(1.0) as u32,
        };
        let mut options = usvg::Options::default();
        options.fontdb_mut().load_system_fonts();
        Ok(Self {
            settings,
            viewport,
            canvas,
            options,
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Builds the SVG scene for one frame; pure string assembly, no raster
    /// work, so it is cheap to inspect in tests.
    pub fn scene_svg(&self, state: &FrameState) -> String {
        let s = &self.settings;
        let px_per_pt = s.dpi / 72.0;
        let (w, h) = (self.canvas.width, self.canvas.height);

        let mut points = String::new();
        for p in &state.trace {
            let (x, y) = self.viewport.project(self.canvas, p.t, p.v);
            let _ = write!(points, "{x:.2},{y:.2} ");
        }

        let (mx, my) = self
            .viewport
            .project(self.canvas, state.marker.t, state.marker.v);
        let (dx, dy) = s.label_offset;
        let (lx, ly) = (mx + dx * px_per_pt, my + dy * px_per_pt);

        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        );
        let _ = write!(
            svg,
            r#"<polyline fill="none" stroke="{color}" stroke-width="{sw:.2}" stroke-linejoin="round" stroke-linecap="round" points="{points}"/>"#,
            color = s.color,
            sw = s.line_width * px_per_pt,
            points = points.trim_end(),
        );
        let _ = write!(
            svg,
            r#"<circle cx="{mx:.2}" cy="{my:.2}" r="{r:.2}" fill="{color}"/>"#,
            r = s.marker_radius * px_per_pt,
            color = s.color,
        );
        let _ = write!(
            svg,
            r#"<text x="{lx:.2}" y="{ly:.2}" font-family="sans-serif" font-size="{fs:.2}" fill="{color}" dominant-baseline="central">{label}</text>"#,
            fs = s.font_size * px_per_pt,
            color = s.color,
            label = escape_xml(&state.label),
        );
        svg.push_str("</svg>");
        svg
    }

    pub fn render(&self, state: &FrameState) -> OsdResult<FrameRGBA> {
        let svg = self.scene_svg(state);
        let tree = usvg::Tree::from_str(&svg, &self.options)
            .map_err(|e| OsdError::render(format!("build frame scene: {e}")))?;

        let mut pixmap = tiny_skia::Pixmap::new(self.canvas.width, self.canvas.height)
            .ok_or_else(|| OsdError::render("could not allocate frame pixmap"))?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: pixmap.take(),
            premultiplied: true,
        })
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
