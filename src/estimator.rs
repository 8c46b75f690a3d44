//! Fixed-epoch batch gradient descent for `y = slope * x + intercept`.
//!
//! Every step computes the exact mean-squared-error gradient over the whole
//! dataset and moves both parameters against it. A non-finite value anywhere in
//! the computation aborts the run with a divergence error.

use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{Reduction, TrainConfig, DEFAULT_PROGRESS_EVERY};
use crate::error::{FitError, FitResult};
use crate::sample::{Dataset, Sample};

/// Slope and intercept of the fit, in standardized coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub slope: f64,
    pub intercept: f64,
}

impl ModelParams {
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn is_finite(&self) -> bool {
        self.slope.is_finite() && self.intercept.is_finite()
    }
}

/// Parameters produced by one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub epoch: usize,
    pub params: ModelParams,
}

fn residual(params: ModelParams, sample: &Sample) -> f64 {
    sample.y - params.predict(sample.x)
}

fn contribution_is_finite(params: ModelParams, sample: &Sample, error: f64) -> bool {
    sample.is_finite() && params.is_finite() && error.is_finite()
}

fn diverged(index: usize, sample: &Sample, params: ModelParams, error: f64) -> FitError {
    FitError::Diverged {
        index,
        x: sample.x,
        y: sample.y,
        slope: params.slope,
        intercept: params.intercept,
        error,
    }
}

fn apply(
    params: ModelParams,
    grad_slope: f64,
    grad_intercept: f64,
    learning_rate: f64,
) -> FitResult<ModelParams> {
    let slope = params.slope - grad_slope * learning_rate;
    let intercept = params.intercept - grad_intercept * learning_rate;

    if !(slope.is_finite() && intercept.is_finite()) {
        return Err(FitError::ParamsDiverged { slope, intercept });
    }

    Ok(ModelParams { slope, intercept })
}

/// One full-batch gradient-descent update, summing in sample order.
///
/// An empty dataset contributes no gradient and leaves `params` unchanged.
///
/// # Errors
/// `FitError::Diverged` for the first sample whose inputs, the current
/// parameters, or the residual are non-finite. `FitError::ParamsDiverged` when
/// the updated parameters are non-finite.
pub fn step(params: ModelParams, dataset: &Dataset, learning_rate: f64) -> FitResult<ModelParams> {
    let n = dataset.len() as f64;
    let mut grad_slope = 0.0;
    let mut grad_intercept = 0.0;

    for (index, sample) in dataset.iter().enumerate() {
        let error = residual(params, sample);

        grad_slope += -(2.0 / n) * sample.x * error;
        grad_intercept += -(2.0 / n) * error;

        if !contribution_is_finite(params, sample, error) {
            return Err(diverged(index, sample, params, error));
        }
    }

    apply(params, grad_slope, grad_intercept, learning_rate)
}

/// Same update as [`step`] with the gradient sum spread over rayon's pool.
///
/// Divergence still names the lowest offending sample index.
pub fn step_parallel(
    params: ModelParams,
    dataset: &Dataset,
    learning_rate: f64,
) -> FitResult<ModelParams> {
    let n = dataset.len() as f64;
    let samples = dataset.samples();

    let offending = samples.par_iter().enumerate().find_first(|&(_, sample)| {
        !contribution_is_finite(params, sample, residual(params, sample))
    });
    if let Some((index, sample)) = offending {
        return Err(diverged(index, sample, params, residual(params, sample)));
    }

    let (grad_slope, grad_intercept) = samples
        .par_iter()
        .map(|sample| {
            let error = residual(params, sample);
            (-(2.0 / n) * sample.x * error, -(2.0 / n) * error)
        })
        .reduce(|| (0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1));

    apply(params, grad_slope, grad_intercept, learning_rate)
}

/// Applies [`step`] exactly `epochs` times starting from `initial`.
///
/// Logs the epoch index every 50 epochs, starting with epoch 0.
pub fn run(
    initial: ModelParams,
    dataset: &Dataset,
    learning_rate: f64,
    epochs: usize,
) -> FitResult<ModelParams> {
    let mut params = initial;
    for epoch in 0..epochs {
        if epoch % DEFAULT_PROGRESS_EVERY == 0 {
            info!("epoch {epoch}");
        }
        params = step(params, dataset, learning_rate)?;
    }

    Ok(params)
}

pub fn mean_squared_error(params: ModelParams, dataset: &Dataset) -> f64 {
    let sum = dataset
        .iter()
        .map(|sample| residual(params, sample).powi(2))
        .sum::<f64>();

    sum / dataset.len() as f64
}

/// Gradient descent driven by a [`TrainConfig`].
#[derive(Debug, Clone, Default)]
pub struct Estimator {
    config: TrainConfig,
}

impl Estimator {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn step(&self, params: ModelParams, dataset: &Dataset) -> FitResult<ModelParams> {
        match self.config.reduction {
            Reduction::Sequential => step(params, dataset, self.config.learning_rate),
            Reduction::Parallel => step_parallel(params, dataset, self.config.learning_rate),
        }
    }

    /// Runs every configured epoch and returns the final parameters.
    pub fn fit(&self, dataset: &Dataset) -> FitResult<ModelParams> {
        let mut params = self.config.initial;
        for snapshot in self.snapshots(dataset) {
            params = snapshot?.params;
        }

        Ok(params)
    }

    /// Lazily yields the parameters after each epoch.
    ///
    /// The config is validated on the first call to `next`. The iterator ends
    /// after the configured number of epochs, or right after yielding the first
    /// error.
    pub fn snapshots<'a>(&'a self, dataset: &'a Dataset) -> Snapshots<'a> {
        Snapshots {
            estimator: self,
            dataset,
            params: self.config.initial,
            epoch: 0,
            started: None,
            failed: false,
        }
    }
}

pub struct Snapshots<'a> {
    estimator: &'a Estimator,
    dataset: &'a Dataset,
    params: ModelParams,
    epoch: usize,
    started: Option<Instant>,
    failed: bool,
}

impl Snapshots<'_> {
    fn advance(&mut self, started: Instant) -> FitResult<Snapshot> {
        let config = &self.estimator.config;
        let epoch = self.epoch;

        if let Some(deadline) = config.deadline {
            if started.elapsed() >= deadline {
                return Err(FitError::DeadlineExceeded { epoch });
            }
        }
        if config.is_progress_epoch(epoch) {
            info!("epoch {epoch}");
            debug!("epoch {epoch} mse {}", mean_squared_error(self.params, self.dataset));
        }

        let params = self.estimator.step(self.params, self.dataset)?;
        self.params = params;
        self.epoch += 1;

        Ok(Snapshot { epoch, params })
    }
}

impl Iterator for Snapshots<'_> {
    type Item = FitResult<Snapshot>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let started = match self.started {
            Some(started) => started,
            None => {
                if let Err(e) = self.estimator.config.validate() {
                    self.failed = true;
                    return Some(Err(e));
                }
                *self.started.insert(Instant::now())
            }
        };
        if self.epoch >= self.estimator.config.epochs {
            return None;
        }

        let result = self.advance(started);
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}
