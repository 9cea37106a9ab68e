//! Summary statistics for calibrating detector thresholds.
//!
//! These numbers are reported alongside each artifact. They never gate a
//! detector at run time.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std: f64,
}

impl SummaryStats {
    /// Describe a series, skipping NaN entries. An empty series gives NaN
    /// for every statistic; a single value gives NaN std.
    pub fn from_series<I>(series: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let values: Vec<f64> = series.into_iter().filter(|v| !v.is_nan()).collect();
        let count = values.len();
        if count == 0 {
            return Self {
                count,
                mean: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
                std: f64::NAN,
            };
        }

        let mean = values.iter().sum::<f64>() / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let std = if count > 1 {
            let sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (sq / (count - 1) as f64).sqrt()
        } else {
            f64::NAN
        };

        Self {
            count,
            mean,
            min,
            max,
            std,
        }
    }
}

/// A named statistic for one metric column of a detector's aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct Calibration {
    pub metric: &'static str,
    pub stats: SummaryStats,
}

impl Calibration {
    pub fn new<I>(metric: &'static str, series: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self {
            metric,
            stats: SummaryStats::from_series(series),
        }
    }
}

impl std::fmt::Display for Calibration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = &self.stats;
        write!(
            f,
            "{}: n={} avg={:.2} min={:.2} max={:.2} std={:.2}",
            self.metric, s.count, s.mean, s.min, s.max, s.std
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_std_uses_n_minus_one() {
        let stats = SummaryStats::from_series([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.count, 8);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        assert!((stats.std - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn empty_series_is_all_nan() {
        let stats = SummaryStats::from_series(Vec::<f64>::new());
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_nan());
        assert!(stats.min.is_nan());
        assert!(stats.max.is_nan());
        assert!(stats.std.is_nan());
    }

    #[test]
    fn single_value_has_no_spread() {
        let stats = SummaryStats::from_series([42.0]);
        assert_eq!(stats.mean, 42.0);
        assert!(stats.std.is_nan());
    }

    #[test]
    fn missing_values_are_skipped() {
        let stats = SummaryStats::from_series([1.0, f64::NAN, 3.0]);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean, 2.0);
    }
}
