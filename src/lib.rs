// Modules
pub mod calibration;
pub mod config;
pub mod data;
pub mod errors;
pub mod metrics;
pub mod optimize;
pub mod predictor;
pub mod utils;

// Individual classes, and functions
pub use calibration::{build, Calibrator, CalibratorIO};
pub use config::{CalibrationMethod, CalibratorConfig, DatasetType, RegressionCalibratorMetric};
pub use errors::CalibrationError;
pub use predictor::{CalibrationDataset, InMemoryPredictor, PredictorFactory, PredictorOptions, UncertaintyPredictor};
