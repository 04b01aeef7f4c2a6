use crate::series::CorrectedSeries;

/// Result of sampling the continuous trace at one query time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interpolated {
    /// Linearly interpolated value at the query time.
    pub value: f64,
    /// Number of leading series points fully passed by the query time; grows
    /// monotonically as the query time advances.
    pub prefix_len: usize,
}

/// Samples the series at query time `q`.
///
/// The bracketing pair is found by binary search and clamped so that exactly
/// one interpolation segment always exists: queries before the first point or
/// past the second-to-last point extend the nearest segment's line rather
/// than holding a constant or failing out of range.
pub fn sample_at(series: &CorrectedSeries, q: f64) -> Interpolated {
    let pts = series.points();
    let ix = pts.partition_point(|p| p.t <= q);

    // The prefix never reaches past the second-to-last point, so the trace
    // head always sits on a real segment.
    let prefix_len = ix.min(pts.len() - 2);
    let seg = prefix_len.max(1);

    let a = pts[seg - 1];
    let b = pts[seg];
    let value = if b.t == a.t {
        a.v
    } else {
        a.v + (b.v - a.v) * (q - a.t) / (b.t - a.t)
    };

    Interpolated { value, prefix_len }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::SamplePoint;

    fn series(raw: &[(f64, f64)]) -> CorrectedSeries {
        CorrectedSeries::new(raw.iter().map(|&(t, v)| SamplePoint { t, v }).collect()).unwrap()
    }

    #[test]
    fn midpoint_of_a_two_point_series() {
        let s = series(&[(0.0, 0.0), (10.0, 100.0)]);
        let got = sample_at(&s, 5.0);
        assert_eq!(got.value, 50.0);
        assert_eq!(got.prefix_len, 0);
    }

    #[test]
    fn interpolates_inside_interior_segments() {
        let s = series(&[(0.0, 0.0), (10.0, 10.0), (20.0, 30.0), (30.0, 30.0)]);
        let got = sample_at(&s, 15.0);
        assert_eq!(got.value, 20.0);
        assert_eq!(got.prefix_len, 2);
    }

    #[test]
    fn query_before_start_extends_first_segment() {
        let s = series(&[(10.0, 10.0), (20.0, 30.0), (30.0, 40.0)]);
        let got = sample_at(&s, 5.0);
        // First segment has slope 2, extended backwards.
        assert_eq!(got.value, 0.0);
        assert_eq!(got.prefix_len, 0);
    }

    #[test]
    fn query_past_end_extends_last_usable_segment() {
        let s = series(&[(0.0, 0.0), (10.0, 10.0), (20.0, 30.0)]);
        let got = sample_at(&s, 25.0);
        // The bracketing pair clamps to the segment ending at the
        // second-to-last point: [(0,0),(10,10)], slope 1 extended.
        assert_eq!(got.value, 25.0);
        assert_eq!(got.prefix_len, 1);
    }

    #[test]
    fn prefix_grows_monotonically_with_query_time() {
        let s = series(&[(0.0, 0.0), (1.0, 1.0), (4.0, 2.0), (6.0, 3.0), (9.0, 4.0)]);
        let mut last = 0;
        for step in 0..100 {
            let q = -1.0 + step as f64 * 0.12;
            let got = sample_at(&s, q);
            assert!(got.prefix_len >= last, "prefix shrank at q={q}");
            last = got.prefix_len;
        }
        assert_eq!(last, s.len() - 2);
    }

    #[test]
    fn query_on_a_sample_passes_it() {
        let s = series(&[(0.0, 0.0), (1.0, 2.0), (2.0, 4.0), (3.0, 6.0)]);
        let got = sample_at(&s, 1.0);
        assert_eq!(got.value, 2.0);
        assert_eq!(got.prefix_len, 2);
    }

    #[test]
    fn duplicate_times_do_not_divide_by_zero() {
        let s = series(&[(1.0, 3.0), (1.0, 5.0)]);
        let got = sample_at(&s, 1.0);
        assert_eq!(got.value, 3.0);
    }
}
