use std::path::Path;

use anyhow::Context as _;

use crate::{
    error::{OsdError, OsdResult},
    extract::RawSample,
    series::{CorrectedSeries, SamplePoint},
};

/// Linear clock-drift compensation: `t' = t - (t - reference) * stretch`.
///
/// `reference` is the instant that maps to itself; `stretch` is the fraction
/// of drift accumulated per second of distance from it. A pre-fitted constant
/// per recording session, not derived from the data at runtime.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimeCorrection {
    pub reference: f64,
    pub stretch: f64,
}

impl TimeCorrection {
    pub fn identity() -> Self {
        Self {
            reference: 0.0,
            stretch: 0.0,
        }
    }

    pub fn apply(&self, t: f64) -> f64 {
        t - (t - self.reference) * self.stretch
    }
}

impl Default for TimeCorrection {
    fn default() -> Self {
        Self::identity()
    }
}

/// Linearly-ramping zero-offset compensation.
///
/// The *offset* (not the value) ramps from `offset_start` at corrected time
/// `ramp_start` to `offset_end` at `ramp_end`:
/// `v' = v - offset_start - (offset_end - offset_start) * (t - ramp_start) / (ramp_end - ramp_start)`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ValueCorrection {
    pub offset_start: f64,
    pub offset_end: f64,
    pub ramp_start: f64,
    pub ramp_end: f64,
}

impl ValueCorrection {
    pub fn identity() -> Self {
        Self {
            offset_start: 0.0,
            offset_end: 0.0,
            ramp_start: 0.0,
            ramp_end: 1.0,
        }
    }

    pub fn apply(&self, t: f64, v: f64) -> f64 {
        let ramp = (t - self.ramp_start) / (self.ramp_end - self.ramp_start);
        v - self.offset_start - (self.offset_end - self.offset_start) * ramp
    }
}

impl Default for ValueCorrection {
    fn default() -> Self {
        Self::identity()
    }
}

/// The two fixed linear transforms applied to every raw series.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationParams {
    #[serde(default)]
    pub time: TimeCorrection,
    #[serde(default)]
    pub value: ValueCorrection,
}

impl CalibrationParams {
    pub fn from_json_path(path: impl AsRef<Path>) -> OsdResult<Self> {
        let path = path.as_ref();
        let f = std::fs::File::open(path)
            .with_context(|| format!("open calibration file '{}'", path.display()))?;
        let params: Self = serde_json::from_reader(std::io::BufReader::new(f))
            .map_err(|e| OsdError::calibration(format!("parse '{}': {e}", path.display())))?;
        params.validate()?;
        Ok(params)
    }

    /// Checked once at startup, before any sample is processed.
    pub fn validate(&self) -> OsdResult<()> {
        for (name, value) in [
            ("time.reference", self.time.reference),
            ("time.stretch", self.time.stretch),
            ("value.offset_start", self.value.offset_start),
            ("value.offset_end", self.value.offset_end),
            ("value.ramp_start", self.value.ramp_start),
            ("value.ramp_end", self.value.ramp_end),
        ] {
            if !value.is_finite() {
                return Err(OsdError::calibration(format!("{name} must be finite")));
            }
        }
        if self.time.stretch >= 1.0 {
            // t' = t*(1-stretch) + reference*stretch; stretch >= 1 would stop
            // or reverse the corrected time axis.
            return Err(OsdError::calibration("time.stretch must be < 1"));
        }
        if self.value.ramp_end == self.value.ramp_start {
            return Err(OsdError::calibration(
                "value.ramp_end must differ from value.ramp_start (zero denominator)",
            ));
        }
        Ok(())
    }

    /// Applies the time transform, then the value transform (which reads the
    /// already-corrected time), preserving length and order.
    pub fn apply(&self, samples: &[RawSample]) -> OsdResult<CorrectedSeries> {
        self.validate()?;
        let points = samples
            .iter()
            .map(|s| {
                let t = self.time.apply(s.t);
                SamplePoint {
                    t,
                    v: self.value.apply(t, s.v),
                }
            })
            .collect();
        CorrectedSeries::new(points)
    }
}
