use thiserror::Error;

use crate::sample::Axis;

pub type FitResult<T> = Result<T, FitError>;

/// Errors raised while standardizing data or running gradient descent.
///
/// `Diverged` and `ParamsDiverged` are fatal to a fitting run: the epoch loop
/// stops at the first one and no partial parameters are returned.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FitError {
    #[error(
        "diverged at sample {index}: x={x}, y={y}, slope={slope}, intercept={intercept}, error={error}"
    )]
    Diverged {
        index: usize,
        x: f64,
        y: f64,
        slope: f64,
        intercept: f64,
        error: f64,
    },
    #[error("parameters diverged: slope={slope}, intercept={intercept}")]
    ParamsDiverged { slope: f64, intercept: f64 },
    #[error("at least 2 samples are needed to standardize, got {got}")]
    InsufficientSamples { got: usize },
    #[error("{axis} axis has zero variance and cannot be standardized")]
    DegenerateAxis { axis: Axis },
    #[error("{axis} axis statistics overflowed: mean={mean}, std_dev={std_dev}")]
    NonFiniteMoments { axis: Axis, mean: f64, std_dev: f64 },
    #[error("invalid training configuration: {0}")]
    InvalidConfig(String),
    #[error("deadline exceeded before epoch {epoch}")]
    DeadlineExceeded { epoch: usize },
}

impl FitError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        FitError::InvalidConfig(message.into())
    }

    /// True for the two numerical-instability variants.
    pub fn is_divergence(&self) -> bool {
        matches!(
            self,
            FitError::Diverged { .. } | FitError::ParamsDiverged { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing column: {0}")]
    MissingColumn(String),
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("pickle error: {0}")]
    Pickle(#[from] serde_pickle::Error),
}
