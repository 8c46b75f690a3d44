pub mod standard_scaler;

pub use standard_scaler::{StandardScaler, StandardizationParams};
