//! Threshold Scale
//! Ordered boundaries partitioning the number line into labeled buckets.

use crate::scale::ScaleError;
use serde::Serialize;

/// `labels.len() == boundaries.len() + 1`, boundaries strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdScale<T> {
    boundaries: Vec<f64>,
    labels: Vec<T>,
}

/// One legend swatch: `[min, max)` with open ends as `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry<T> {
    pub label: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub color: T,
}

impl<T> ThresholdScale<T> {
    pub fn new(boundaries: Vec<f64>, labels: Vec<T>) -> Result<Self, ScaleError> {
        if labels.len() != boundaries.len() + 1 {
            return Err(ScaleError::LabelCount {
                boundaries: boundaries.len(),
                expected: boundaries.len() + 1,
                actual: labels.len(),
            });
        }
        if let Some(i) = boundaries.iter().position(|b| !b.is_finite()) {
            return Err(ScaleError::Unordered(i));
        }
        if let Some(i) = boundaries.windows(2).position(|w| w[0] >= w[1]) {
            return Err(ScaleError::Unordered(i + 1));
        }
        Ok(Self { boundaries, labels })
    }

    /// Bucket index: how many boundaries are `<= value`.
    ///
    /// A value equal to a boundary lands in the upper bucket. `NaN` has no bucket.
    pub fn bucket(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        Some(self.boundaries.partition_point(|t| *t <= value))
    }

    pub fn classify(&self, value: f64) -> Option<&T> {
        self.bucket(value).map(|i| &self.labels[i])
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    pub fn labels(&self) -> &[T] {
        &self.labels
    }
}

impl<T: Clone> ThresholdScale<T> {
    /// Legend rows: `< t0`, `t_i – t_{i+1}`, `> t_last`, each with `unit` appended.
    pub fn legend(&self, unit: &str) -> Vec<LegendEntry<T>> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, color)| {
                let min = i.checked_sub(1).map(|j| self.boundaries[j]);
                let max = self.boundaries.get(i).copied();
                let label = match (min, max) {
                    (None, Some(hi)) => format!("< {hi}{unit}"),
                    (Some(lo), None) => format!("> {lo}{unit}"),
                    (Some(lo), Some(hi)) => format!("{lo} – {hi}{unit}"),
                    (None, None) => "All values".to_string(),
                };
                LegendEntry {
                    label,
                    min,
                    max,
                    color: color.clone(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inflation_scale() -> ThresholdScale<usize> {
        ThresholdScale::new(vec![-5.0, 0.0, 2.0, 5.0, 10.0, 20.0, 50.0], (0..8).collect()).unwrap()
    }

    #[test]
    fn boundary_values_go_up() {
        let s = inflation_scale();
        assert_eq!(s.classify(-6.0), Some(&0));
        assert_eq!(s.classify(-5.0), Some(&1));
        assert_eq!(s.classify(0.0), Some(&2));
        assert_eq!(s.classify(1.99), Some(&2));
        assert_eq!(s.classify(50.0), Some(&7));
        assert_eq!(s.classify(1e9), Some(&7));
        assert_eq!(s.classify(f64::NEG_INFINITY), Some(&0));
        assert_eq!(s.classify(f64::NAN), None);
    }

    #[test]
    fn construction_checks_shape() {
        assert_eq!(
            ThresholdScale::new(vec![1.0, 2.0], vec!["a", "b"]).unwrap_err(),
            ScaleError::LabelCount {
                boundaries: 2,
                expected: 3,
                actual: 2
            }
        );
        assert_eq!(
            ThresholdScale::new(vec![1.0, 1.0], vec!["a", "b", "c"]).unwrap_err(),
            ScaleError::Unordered(1)
        );
        assert_eq!(
            ThresholdScale::new(vec![f64::NAN], vec!["a", "b"]).unwrap_err(),
            ScaleError::Unordered(0)
        );
    }

    #[test]
    fn legend_labels() {
        let s = ThresholdScale::new(vec![-5.0, 0.0, 2.5], vec!['a', 'b', 'c', 'd']).unwrap();
        let labels: Vec<String> = s.legend("%").into_iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["< -5%", "-5 – 0%", "0 – 2.5%", "> 2.5%"]);
    }

    #[test]
    fn single_bucket_scale() {
        let s = ThresholdScale::new(vec![], vec!["only"]).unwrap();
        assert_eq!(s.classify(42.0), Some(&"only"));
        assert_eq!(s.legend("")[0].label, "All values");
    }
}
