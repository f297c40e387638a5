//! Statistics Calculator Module
//! Descriptive statistics and axis domains for chart series.

use serde::Serialize;
use statrs::statistics::Statistics;

/// Descriptive statistics for a series of values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` below two values.
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Summarize finite values; `None` when there are none.
    pub fn summarize(values: &[f64]) -> Option<SeriesSummary> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }

        let (min, max) = finite
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let std_dev = (finite.len() > 1).then(|| finite.iter().std_dev());

        Some(SeriesSummary {
            count: finite.len(),
            mean: finite.iter().mean(),
            std_dev,
            min,
            max,
        })
    }

    /// Mean of the finite values.
    pub fn mean(values: &[f64]) -> Option<f64> {
        Self::summarize(values).map(|s| s.mean)
    }

    /// Widen `[min, max]` outwards by the given fractions of each end's magnitude.
    pub fn padded_domain(min: f64, max: f64, lower_pad: f64, upper_pad: f64) -> [f64; 2] {
        [min - min.abs() * lower_pad, max + max.abs() * upper_pad]
    }

    /// Domain anchored at zero: `[min(0, min), max * upper_factor]`.
    pub fn zero_anchored_domain(min: f64, max: f64, upper_factor: f64) -> [f64; 2] {
        [min.min(0.0), max * upper_factor]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn summary_of_series() {
        let s = StatsCalculator::summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(s.count, 8);
        assert_relative_eq!(s.mean, 5.0, epsilon = 1e-9);
        assert_relative_eq!(s.std_dev.unwrap(), 2.138089935299395, epsilon = 1e-12);
        assert_eq!((s.min, s.max), (2.0, 9.0));
    }

    #[test]
    fn non_finite_values_are_ignored() {
        let s = StatsCalculator::summarize(&[f64::NAN, 3.0]).unwrap();
        assert_eq!(s.count, 1);
        assert_eq!(s.std_dev, None);
        assert!(StatsCalculator::summarize(&[f64::NAN]).is_none());
        assert!(StatsCalculator::mean(&[]).is_none());
    }

    #[test]
    fn domains() {
        let d = StatsCalculator::padded_domain(2.0, 10.0, 0.1, 0.1);
        assert_relative_eq!(d[0], 1.8, epsilon = 1e-9);
        assert_relative_eq!(d[1], 11.0, epsilon = 1e-9);
        let d = StatsCalculator::padded_domain(-2.0, 10.0, 0.1, 0.1);
        assert_relative_eq!(d[0], -2.2, epsilon = 1e-9);
        assert_eq!(StatsCalculator::zero_anchored_domain(1.0, 10.0, 1.1)[0], 0.0);
        assert_eq!(StatsCalculator::zero_anchored_domain(-1.7, 10.0, 1.1)[0], -1.7);
    }
}
