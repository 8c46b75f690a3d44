use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{FitError, FitResult};
use crate::sample::{Axis, Dataset, Sample};

/// Mean and sample standard deviation of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: f64,
    std_dev: f64,
}

impl StandardScaler {
    pub fn new(mean: f64, std_dev: f64) -> Self {
        StandardScaler { mean, std_dev }
    }

    /// Fits the scaler to one column of `axis`.
    pub fn from_data(data: &[f64], axis: Axis) -> FitResult<Self> {
        if data.len() < 2 {
            return Err(FitError::InsufficientSamples { got: data.len() });
        }
        let (mean, std_dev) = moments(data);
        if !(mean.is_finite() && std_dev.is_finite()) {
            return Err(FitError::NonFiniteMoments {
                axis,
                mean,
                std_dev,
            });
        }
        if std_dev == 0.0 {
            return Err(FitError::DegenerateAxis { axis });
        }

        Ok(StandardScaler { mean, std_dev })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.std_dev
    }

    pub fn inverse(&self, value: f64) -> f64 {
        inverse(value, self.mean, self.std_dev)
    }
}

/// Per-axis scalers fitted over a whole dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardizationParams {
    pub x: StandardScaler,
    pub y: StandardScaler,
}

/// Mean and sample (n - 1) standard deviation of `data`.
///
/// Returns NaN components for inputs too short to define them.
pub fn moments(data: &[f64]) -> (f64, f64) {
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let var = data.iter().map(|&value| (value - mean).powi(2)).sum::<f64>() / (n - 1.0);

    (mean, var.sqrt())
}

pub fn fit(dataset: &Dataset) -> FitResult<StandardizationParams> {
    let params = StandardizationParams {
        x: StandardScaler::from_data(&dataset.column(Axis::X), Axis::X)?,
        y: StandardScaler::from_data(&dataset.column(Axis::Y), Axis::Y)?,
    };
    debug!(
        "fitted standardization over {} samples: x mean/std {}/{}, y mean/std {}/{}",
        dataset.len(),
        params.x.mean,
        params.x.std_dev,
        params.y.mean,
        params.y.std_dev
    );

    Ok(params)
}

pub fn transform(dataset: &Dataset, params: &StandardizationParams) -> Dataset {
    dataset
        .iter()
        .map(|s| Sample::new(params.x.transform(s.x), params.y.transform(s.y)))
        .collect()
}

pub fn inverse(value: f64, mean: f64, std: f64) -> f64 {
    value * std + mean
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn uses_sample_standard_deviation() {
        let (mean, std) = moments(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((mean - 5.0).abs() < EPS);
        // population std is 2.0; the n - 1 estimator is sqrt(32 / 7)
        assert!((std - (32.0f64 / 7.0).sqrt()).abs() < EPS);
    }

    #[test]
    fn rejects_short_and_flat_columns() {
        assert_eq!(
            StandardScaler::from_data(&[1.0], Axis::X),
            Err(FitError::InsufficientSamples { got: 1 })
        );
        assert_eq!(
            StandardScaler::from_data(&[], Axis::X),
            Err(FitError::InsufficientSamples { got: 0 })
        );
        assert_eq!(
            StandardScaler::from_data(&[3.0, 3.0, 3.0], Axis::Y),
            Err(FitError::DegenerateAxis { axis: Axis::Y })
        );
    }

    #[test]
    fn overflowing_column_is_not_called_flat() {
        match StandardScaler::from_data(&[1e200, -1e200, 3e200], Axis::X) {
            Err(FitError::NonFiniteMoments { axis, mean, std_dev }) => {
                assert_eq!(axis, Axis::X);
                assert!(mean.is_finite());
                assert_eq!(std_dev, f64::INFINITY);
            }
            other => panic!("expected non-finite moments, got {other:?}"),
        }
    }

    #[test]
    fn fit_reports_the_flat_axis() {
        let data = Dataset::from_pairs([(1.0, 5.0), (1.0, 6.0)]);
        assert_eq!(fit(&data), Err(FitError::DegenerateAxis { axis: Axis::X }));
    }

    #[test]
    fn transform_leaves_input_untouched() {
        let data = Dataset::from_pairs([(1.0, 10.0), (3.0, 30.0)]);
        let before = data.clone();
        let params = fit(&data).unwrap();
        let scaled = transform(&data, &params);

        assert_eq!(data, before);
        assert_ne!(scaled, data);
        assert_eq!(scaled.len(), data.len());
    }

    #[test]
    fn inverse_matches_formula() {
        assert_eq!(inverse(2.0, 10.0, 3.0), 16.0);
        assert_eq!(StandardScaler::new(10.0, 3.0).inverse(-1.0), 7.0);
    }

    fn dataset_strategy() -> impl Strategy<Value = Vec<(f64, f64)>> {
        prop::collection::vec((-1e4f64..1e4, -1e4f64..1e4), 2..64)
    }

    proptest! {
        #[test]
        fn inverse_undoes_transform(
            v in -1e6f64..1e6,
            mean in -1e3f64..1e3,
            std in 1e-3f64..1e3,
        ) {
            let scaler = StandardScaler::new(mean, std);
            let back = scaler.inverse(scaler.transform(v));
            prop_assert!((back - v).abs() <= 1e-9 * v.abs().max(1.0));
        }

        #[test]
        fn transformed_columns_are_standard(pairs in dataset_strategy()) {
            let data = Dataset::from_pairs(pairs);
            // skip near-flat columns where the rescaling is ill-conditioned
            let (_, sx) = moments(&data.column(Axis::X));
            let (_, sy) = moments(&data.column(Axis::Y));
            prop_assume!(sx > 1e-3 && sy > 1e-3);

            let params = fit(&data).unwrap();
            let scaled = transform(&data, &params);
            for axis in [Axis::X, Axis::Y] {
                let (mean, std) = moments(&scaled.column(axis));
                prop_assert!(mean.abs() < 1e-6, "{axis} mean {mean}");
                prop_assert!((std - 1.0).abs() < 1e-6, "{axis} std {std}");
            }
        }
    }
}
