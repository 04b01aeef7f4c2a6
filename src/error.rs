pub type OsdResult<T> = Result<T, OsdError>;

#[derive(thiserror::Error, Debug)]
pub enum OsdError {
    #[error("malformed timestamp in row {row}: {raw:?}")]
    MalformedTimestamp { row: usize, raw: String },

    #[error("invalid value for field {field:?} in row {row}: {raw:?}")]
    InvalidFieldValue {
        field: String,
        row: usize,
        raw: String,
    },

    #[error("invalid calibration: {0}")]
    InvalidCalibration(String),

    #[error(
        "window start={start}s duration={duration}s yielded {found} sample(s), \
         interpolation needs at least 2"
    )]
    EmptySeries {
        start: f64,
        duration: f64,
        found: usize,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("csv read error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OsdError {
    pub fn calibration(msg: impl Into<String>) -> Self {
        Self::InvalidCalibration(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            OsdError::calibration("x")
                .to_string()
                .contains("invalid calibration:")
        );
        assert!(
            OsdError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(OsdError::render("x").to_string().contains("render error:"));
        assert!(OsdError::encode("x").to_string().contains("encode error:"));
    }

    #[test]
    fn empty_series_names_the_window() {
        let err = OsdError::EmptySeries {
            start: 12.5,
            duration: 60.0,
            found: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("start=12.5s"));
        assert!(msg.contains("duration=60s"));
        assert!(msg.contains("1 sample"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = OsdError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
