use crate::error::{OsdError, OsdResult};

/// One point of the corrected series.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SamplePoint {
    pub t: f64,
    pub v: f64,
}

/// The drift-corrected sample series; the only series ever rendered.
///
/// Invariants enforced at construction: at least two points (interpolation
/// needs one bracketing pair) and monotonic non-decreasing times.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrectedSeries {
    points: Vec<SamplePoint>,
}

impl CorrectedSeries {
    pub fn new(points: Vec<SamplePoint>) -> OsdResult<Self> {
        if points.len() < 2 {
            return Err(OsdError::validation(
                "corrected series needs at least two points",
            ));
        }
        if !points.windows(2).all(|w| w[0].t <= w[1].t) {
            return Err(OsdError::validation(
                "corrected series times must be monotonic non-decreasing",
            ));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// `(first, last)` corrected time.
    pub fn time_bounds(&self) -> (f64, f64) {
        (self.points[0].t, self.points[self.points.len() - 1].t)
    }

    /// `(min, max)` corrected value.
    pub fn value_bounds(&self) -> (f64, f64) {
        self.points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), p| (lo.min(p.v), hi.max(p.v)),
        )
    }
}
