use crate::{
    core::{Fps, FrameIndex},
    interp::sample_at,
    series::{CorrectedSeries, SamplePoint},
};

/// Everything one rendered frame needs; recomputed fresh per frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameState {
    /// Query time of this frame on the corrected time axis.
    pub display_t: f64,
    /// Passed samples plus the interpolated head; the drawn line always ends
    /// exactly at the current query time, never at the last real sample.
    pub trace: Vec<SamplePoint>,
    /// Coincides with the final trace point.
    pub marker: SamplePoint,
    pub label: String,
}

/// How the live numeric label is rendered.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LabelFormat {
    pub unit: String,
    pub decimals: usize,
}

impl Default for LabelFormat {
    fn default() -> Self {
        Self {
            unit: "m".to_string(),
            decimals: 1,
        }
    }
}

impl LabelFormat {
    pub fn format(&self, value: f64) -> String {
        format!("{value:.prec$} {unit}", prec = self.decimals, unit = self.unit)
    }
}

/// Computes the state of frame `frame` at `fps`, starting at elapsed-time
/// offset `start`.
///
/// A pure function of its arguments: preview and export share it, and frames
/// may be computed in any order as long as they are delivered in order.
pub fn frame_state(
    series: &CorrectedSeries,
    frame: FrameIndex,
    fps: Fps,
    start: f64,
    label: &LabelFormat,
) -> FrameState {
    let q = start + fps.frames_to_secs(frame.0);
    let interp = sample_at(series, q);
    let head = SamplePoint {
        t: q,
        v: interp.value,
    };

    let mut trace = Vec::with_capacity(interp.prefix_len + 1);
    trace.extend_from_slice(&series.points()[..interp.prefix_len]);
    trace.push(head);

    FrameState {
        display_t: q,
        trace,
        marker: head,
        label: label.format(interp.value),
    }
}
