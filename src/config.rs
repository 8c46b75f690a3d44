use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FitError, FitResult};
use crate::estimator::ModelParams;

pub const DEFAULT_LEARNING_RATE: f64 = 0.01;
pub const DEFAULT_EPOCHS: usize = 1000;
pub const DEFAULT_PROGRESS_EVERY: usize = 50;

/// How the per-sample gradient contributions of one step are summed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reduction {
    /// In sample order, reproducing the reference numerics exactly.
    #[default]
    Sequential,
    /// Across the rayon thread pool; equal up to summation-order rounding.
    Parallel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub learning_rate: f64,
    pub epochs: usize,
    pub initial: ModelParams,
    /// Epochs between progress log lines, starting at epoch 0.
    pub progress_every: usize,
    pub reduction: Reduction,
    /// Wall-clock budget for the whole epoch loop.
    pub deadline: Option<Duration>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
            epochs: DEFAULT_EPOCHS,
            initial: ModelParams::default(),
            progress_every: DEFAULT_PROGRESS_EVERY,
            reduction: Reduction::default(),
            deadline: None,
        }
    }
}

impl TrainConfig {
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_initial(mut self, initial: ModelParams) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn validate(&self) -> FitResult<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(FitError::invalid_config(format!(
                "learning rate must be finite and positive, got {}",
                self.learning_rate
            )));
        }
        if self.progress_every == 0 {
            return Err(FitError::invalid_config("progress interval must be positive"));
        }

        Ok(())
    }

    pub fn is_progress_epoch(&self, epoch: usize) -> bool {
        epoch % self.progress_every == 0
    }
}
