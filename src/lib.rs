//! Univariate linear regression of fuel efficiency on vehicle weight, fitted by
//! fixed-epoch batch gradient descent over standardized data.

pub mod config;
pub mod error;
pub mod estimator;
pub mod ingest;
pub mod model;
pub mod report;
pub mod sample;
pub mod scalers;

pub use config::{Reduction, TrainConfig};
pub use error::{FitError, FitResult, IngestError, PersistError};
pub use estimator::{run, step, Estimator, ModelParams, Snapshot};
pub use model::FittedModel;
pub use sample::{Axis, Dataset, Sample};
pub use scalers::{StandardScaler, StandardizationParams};
