use chrono::NaiveDateTime;

use crate::{
    error::{OsdError, OsdResult},
    rows::Row,
};

pub const DATE_COLUMN: &str = "Date";
pub const TIME_COLUMN: &str = "Time";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One extracted telemetry sample on the zero-based elapsed-time axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawSample {
    /// Seconds since the first timestamp in the source.
    pub t: f64,
    pub v: f64,
}

/// Time window selecting samples by elapsed time, both bounds inclusive.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct ExtractWindow {
    pub start: f64,
    pub duration: f64,
}

impl ExtractWindow {
    pub fn contains(&self, elapsed: f64) -> bool {
        elapsed >= self.start && elapsed - self.start <= self.duration
    }
}

/// Extracts the ordered `(elapsed, value)` series for `field` from a row
/// sequence, keeping only rows inside `window` and collapsing runs of equal
/// retained values to their first point.
///
/// The first row's timestamp establishes the zero of the elapsed-time axis
/// whether or not that row falls inside the window. Rows outside the window
/// are skipped before their field value is parsed, so they can never raise
/// [`OsdError::InvalidFieldValue`].
#[tracing::instrument(skip(rows), fields(field = field))]
pub fn extract_series<I>(rows: I, field: &str, window: ExtractWindow) -> OsdResult<Vec<RawSample>>
where
    I: IntoIterator<Item = OsdResult<Row>>,
{
    let mut samples: Vec<RawSample> = Vec::new();
    let mut start_ts: Option<NaiveDateTime> = None;
    let mut prev_val: Option<f64> = None;

    for row in rows {
        let row = row?;
        let ts = parse_timestamp(&row)?;
        let start = *start_ts.get_or_insert(ts);
        let elapsed = elapsed_secs(ts, start);

        if !window.contains(elapsed) {
            continue;
        }

        let raw = row.get(field).unwrap_or("");
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|_| OsdError::InvalidFieldValue {
                field: field.to_string(),
                row: row.number(),
                raw: raw.to_string(),
            })?;

        if prev_val == Some(value) {
            continue;
        }
        prev_val = Some(value);
        samples.push(RawSample { t: elapsed, v: value });
    }

    if samples.len() < 2 {
        return Err(OsdError::EmptySeries {
            start: window.start,
            duration: window.duration,
            found: samples.len(),
        });
    }

    tracing::debug!(count = samples.len(), "extracted samples");
    Ok(samples)
}

fn parse_timestamp(row: &Row) -> OsdResult<NaiveDateTime> {
    let date = row.get(DATE_COLUMN).unwrap_or("");
    let time = row.get(TIME_COLUMN).unwrap_or("");
    let combined = format!("{date} {time}");
    NaiveDateTime::parse_from_str(&combined, TIMESTAMP_FORMAT).map_err(|_| {
        OsdError::MalformedTimestamp {
            row: row.number(),
            raw: combined,
        }
    })
}

fn elapsed_secs(ts: NaiveDateTime, start: NaiveDateTime) -> f64 {
    let delta = ts.signed_duration_since(start);
    delta
        .num_microseconds()
        .map(|us| us as f64 / 1e6)
        .unwrap_or_else(|| delta.num_seconds() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(number: usize, time: &str, value: &str) -> OsdResult<Row> {
        Ok(Row::new(
            number,
            vec![
                (DATE_COLUMN.to_string(), "2021-06-20".to_string()),
                (TIME_COLUMN.to_string(), time.to_string()),
                ("Alt(m)".to_string(), value.to_string()),
            ],
        ))
    }

    fn extract(rows: Vec<OsdResult<Row>>, window: ExtractWindow) -> OsdResult<Vec<RawSample>> {
        extract_series(rows, "Alt(m)", window)
    }

    #[test]
    fn window_bounds_are_inclusive() {
        assert!(!ExtractWindow { start: 0.0, duration: 5.0 }.contains(-1.0));
        let w = ExtractWindow { start: 0.0, duration: 5.0 };
        for elapsed in [0.0, 2.0, 5.0] {
            assert!(w.contains(elapsed), "expected {elapsed} inside window");
        }
        assert!(!w.contains(9.0));
    }

    #[test]
    fn collapses_flat_runs_to_first_point() {
        let rows = vec![
            row(1, "10:00:00.000000", "5"),
            row(2, "10:00:01.000000", "5"),
            row(3, "10:00:02.000000", "5"),
            row(4, "10:00:03.000000", "7"),
        ];
        let window = ExtractWindow { start: 0.0, duration: 3.0 };
        let samples = extract(rows, window).unwrap();
        assert_eq!(
            samples,
            vec![RawSample { t: 0.0, v: 5.0 }, RawSample { t: 3.0, v: 7.0 }]
        );
    }

    #[test]
    fn window_filters_by_elapsed_time() {
        let rows = vec![
            row(1, "10:00:00.000000", "1"),
            row(2, "10:00:02.000000", "2"),
            row(3, "10:00:05.000000", "3"),
            row(4, "10:00:09.000000", "4"),
        ];
        let window = ExtractWindow { start: 0.0, duration: 5.0 };
        let samples = extract(rows, window).unwrap();
        let times: Vec<f64> = samples.iter().map(|s| s.t).collect();
        assert_eq!(times, vec![0.0, 2.0, 5.0]);
    }

    #[test]
    fn first_row_fixes_time_zero_even_outside_window() {
        let rows = vec![
            row(1, "10:00:00.000000", "1"),
            row(2, "10:00:10.000000", "2"),
            row(3, "10:00:12.000000", "3"),
        ];
        let window = ExtractWindow { start: 10.0, duration: 5.0 };
        let samples = extract(rows, window).unwrap();
        assert_eq!(samples[0].t, 10.0);
        assert_eq!(samples[1].t, 12.0);
    }

    #[test]
    fn subsecond_timestamps_keep_precision() {
        let rows = vec![
            row(1, "10:00:00.000000", "1"),
            row(2, "10:00:00.250000", "2"),
            row(3, "10:00:00.500", "3"),
        ];
        let window = ExtractWindow { start: 0.0, duration: 1.0 };
        let samples = extract(rows, window).unwrap();
        assert_eq!(samples[1].t, 0.25);
        assert_eq!(samples[2].t, 0.5);
    }

    #[test]
    fn malformed_timestamp_is_fatal() {
        let rows = vec![row(1, "not-a-time", "1")];
        let window = ExtractWindow { start: 0.0, duration: 5.0 };
        let err = extract(rows, window).unwrap_err();
        assert!(matches!(err, OsdError::MalformedTimestamp { row: 1, .. }));
    }

    #[test]
    fn bad_value_inside_window_is_fatal() {
        let rows = vec![row(1, "10:00:00.000000", "1"), row(2, "10:00:01.000000", "oops")];
        let window = ExtractWindow { start: 0.0, duration: 5.0 };
        let err = extract(rows, window).unwrap_err();
        match err {
            OsdError::InvalidFieldValue { field, row, raw } => {
                assert_eq!(field, "Alt(m)");
                assert_eq!(row, 2);
                assert_eq!(raw, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_value_outside_window_is_ignored() {
        let rows = vec![
            row(1, "10:00:00.000000", "1"),
            row(2, "10:00:01.000000", "2"),
            row(3, "10:00:30.000000", "oops"),
        ];
        let window = ExtractWindow { start: 0.0, duration: 5.0 };
        assert!(extract(rows, window).is_ok());
    }

    #[test]
    fn too_few_samples_reports_the_window() {
        let rows = vec![row(1, "10:00:00.000000", "1")];
        let window = ExtractWindow { start: 0.0, duration: 5.0 };
        let err = extract(rows, window).unwrap_err();
        assert!(matches!(err, OsdError::EmptySeries { found: 1, .. }));
    }
}
