//! Errors
//!
//! Custom error types used throughout the `uncal` crate.
use thiserror::Error;

/// Errors that can occur while configuring, fitting or applying a calibrator.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// First value is the strategy name, second is the dataset type that was provided.
    #[error("{0} is only compatible with regression datasets, but dataset type {1} was provided.")]
    IncompatibleDatasetType(String, String),
    /// Unknown calibration method name.
    #[error("Calibrator type {0} is not currently supported. Available options are: {1}")]
    UnsupportedCalibrator(String, String),
    /// No calibration method was given and none can be inferred.
    #[error("No default calibrator exists for dataset type {0}, a calibration method must be provided.")]
    NoDefaultCalibrator(String),
    /// Invalid value parsing.
    #[error("Invalid value {0} passed for {1}, expected one of {2}.")]
    ParseString(String, String, String),
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
    /// First value names the matrix, second is the expected shape, third is what was found.
    #[error("Shape mismatch for {0}: expected {1} but found {2}.")]
    ShapeMismatch(String, String, String),
    /// Calibration data that no strategy can be fit on.
    #[error("Degenerate calibration data: {0}")]
    DegenerateData(String),
    /// A distribution could not be constructed.
    #[error("Distribution error: {0}")]
    Distribution(String),
    /// The uncertainty predictor could not be built.
    #[error("Unable to build uncertainty predictor: {0}")]
    Predictor(String),
    /// Unable to write calibrator to file.
    #[error("Unable to write calibrator to file: {0}")]
    UnableToWrite(String),
    /// Unable to read calibrator or configuration from file.
    #[error("Unable to read from a file {0}")]
    UnableToRead(String),
}
