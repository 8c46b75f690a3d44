use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use serde_pickle::{DeOptions, SerOptions};

use crate::config::TrainConfig;
use crate::error::{FitResult, PersistError};
use crate::estimator::{mean_squared_error, Estimator, ModelParams};
use crate::sample::{Axis, Dataset};
use crate::scalers::{standard_scaler, StandardizationParams};

/// A trained model together with everything needed to predict raw values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub params: ModelParams,
    pub standardization: StandardizationParams,
    pub config: TrainConfig,
    pub samples: usize,
    /// Mean squared error on the standardized training data.
    pub mse: f64,
    pub fitted_at: DateTime<Utc>,
}

impl FittedModel {
    /// Standardizes `raw`, runs the estimator over it and keeps the scalers.
    pub fn fit(raw: &Dataset, config: TrainConfig) -> FitResult<Self> {
        let standardization = standard_scaler::fit(raw)?;
        let standardized = standard_scaler::transform(raw, &standardization);
        log_moments(&standardized);

        let estimator = Estimator::new(config);
        let params = estimator.fit(&standardized)?;
        let mse = mean_squared_error(params, &standardized);
        info!(
            "fitted slope={} intercept={} mse={mse} over {} samples",
            params.slope,
            params.intercept,
            standardized.len()
        );

        Ok(Self::from_parts(
            params,
            standardization,
            estimator.config().clone(),
            standardized.len(),
            mse,
        ))
    }

    pub fn from_parts(
        params: ModelParams,
        standardization: StandardizationParams,
        config: TrainConfig,
        samples: usize,
        mse: f64,
    ) -> Self {
        Self {
            params,
            standardization,
            config,
            samples,
            mse,
            fitted_at: Utc::now(),
        }
    }

    /// Predicts a raw `y` for a raw `x`: normalize, apply, de-normalize.
    pub fn predict(&self, x_raw: f64) -> f64 {
        let x_norm = self.standardization.x.transform(x_raw);
        let y_norm = self.params.predict(x_norm);
        self.standardization.y.inverse(y_norm)
    }

    /// Rebuilds the training data in standardized space.
    pub fn standardize(&self, raw: &Dataset) -> Dataset {
        standard_scaler::transform(raw, &self.standardization)
    }

    pub fn to_writer<W: Write>(&self, writer: &mut W) -> Result<(), PersistError> {
        serde_pickle::to_writer(writer, self, SerOptions::new())?;
        Ok(())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PersistError> {
        Ok(serde_pickle::from_reader(reader, DeOptions::new())?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }
}

fn log_moments(standardized: &Dataset) {
    for (name, axis) in [("x", Axis::X), ("y", Axis::Y)] {
        let (mean, std) = standard_scaler::moments(&standardized.column(axis));
        info!("{name} mean/std after standardization: {mean} {std}");
    }
}
