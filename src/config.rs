//! Calibrator Configuration
//!
//! Defines the configuration structure and enums used to select and fit a
//! calibrator: calibration methods, calibration metrics and dataset types.
use crate::errors::CalibrationError;
use crate::utils::{items_to_strings, validate_float_parameter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Strategies available for calibrating regression uncertainty.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationMethod {
    /// Gaussian rescaling of the raw standard deviation.
    #[serde(rename = "zscaling")]
    ZScaling,
    /// Student-t rescaling of the ensemble standard error.
    #[serde(rename = "tscaling")]
    TScaling,
    /// Empirical quantile of absolute z-scores.
    ZelikmanInterval,
}

impl CalibrationMethod {
    pub const SUPPORTED: [&'static str; 3] = ["zscaling", "tscaling", "zelikman_interval"];

    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationMethod::ZScaling => "zscaling",
            CalibrationMethod::TScaling => "tscaling",
            CalibrationMethod::ZelikmanInterval => "zelikman_interval",
        }
    }
}

impl FromStr for CalibrationMethod {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zscaling" => Ok(CalibrationMethod::ZScaling),
            "tscaling" => Ok(CalibrationMethod::TScaling),
            "zelikman_interval" => Ok(CalibrationMethod::ZelikmanInterval),
            _ => Err(CalibrationError::UnsupportedCalibrator(
                s.to_string(),
                items_to_strings(&CalibrationMethod::SUPPORTED),
            )),
        }
    }
}

impl fmt::Display for CalibrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the fitted scaling should produce for regression tasks.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegressionCalibratorMetric {
    /// A calibrated standard deviation.
    #[default]
    Stdev,
    /// A symmetric interval half-width at `interval_percentile`.
    Interval,
}

impl FromStr for RegressionCalibratorMetric {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdev" => Ok(RegressionCalibratorMetric::Stdev),
            "interval" => Ok(RegressionCalibratorMetric::Interval),
            _ => Err(CalibrationError::ParseString(
                s.to_string(),
                "RegressionCalibratorMetric".to_string(),
                items_to_strings(&["stdev", "interval"]),
            )),
        }
    }
}

impl fmt::Display for RegressionCalibratorMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegressionCalibratorMetric::Stdev => f.write_str("stdev"),
            RegressionCalibratorMetric::Interval => f.write_str("interval"),
        }
    }
}

/// Kind of targets the upstream model was trained on.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "snake_case")]
pub enum DatasetType {
    #[default]
    Regression,
    Classification,
    Multiclass,
    Spectra,
}

impl FromStr for DatasetType {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regression" => Ok(DatasetType::Regression),
            "classification" => Ok(DatasetType::Classification),
            "multiclass" => Ok(DatasetType::Multiclass),
            "spectra" => Ok(DatasetType::Spectra),
            _ => Err(CalibrationError::ParseString(
                s.to_string(),
                "DatasetType".to_string(),
                items_to_strings(&["regression", "classification", "multiclass", "spectra"]),
            )),
        }
    }
}

impl fmt::Display for DatasetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DatasetType::Regression => "regression",
            DatasetType::Classification => "classification",
            DatasetType::Multiclass => "multiclass",
            DatasetType::Spectra => "spectra",
        };
        f.write_str(s)
    }
}

fn default_interval_percentile() -> f64 {
    95.0
}
fn default_loss_function() -> String {
    "mse".to_string()
}
fn default_batch_size() -> usize {
    50
}
fn default_num_workers() -> usize {
    8
}

/// Configuration shared by every calibrator.
///
/// `loss_function`, `batch_size` and `num_workers` are not interpreted here,
/// they are handed to the predictor factory as is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibratorConfig {
    /// Name of the upstream uncertainty method, used for labelling only.
    pub uncertainty_method: String,
    /// Two-sided confidence level on the 0 to 100 scale.
    #[serde(default = "default_interval_percentile")]
    pub interval_percentile: f64,
    /// Whether to calibrate standard deviations or interval half-widths.
    #[serde(default)]
    pub regression_calibrator_metric: RegressionCalibratorMetric,
    #[serde(default)]
    pub dataset_type: DatasetType,
    #[serde(default = "default_loss_function")]
    pub loss_function: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,
}

impl CalibratorConfig {
    /// Create a configuration with defaults for everything but the uncertainty method.
    pub fn new(uncertainty_method: &str) -> Self {
        CalibratorConfig {
            uncertainty_method: uncertainty_method.to_string(),
            interval_percentile: default_interval_percentile(),
            regression_calibrator_metric: RegressionCalibratorMetric::default(),
            dataset_type: DatasetType::default(),
            loss_function: default_loss_function(),
            batch_size: default_batch_size(),
            num_workers: default_num_workers(),
        }
    }

    pub fn set_interval_percentile(mut self, interval_percentile: f64) -> Self {
        self.interval_percentile = interval_percentile;
        self
    }

    pub fn set_regression_calibrator_metric(mut self, metric: RegressionCalibratorMetric) -> Self {
        self.regression_calibrator_metric = metric;
        self
    }

    pub fn set_dataset_type(mut self, dataset_type: DatasetType) -> Self {
        self.dataset_type = dataset_type;
        self
    }

    pub fn set_loss_function(mut self, loss_function: &str) -> Self {
        self.loss_function = loss_function.to_string();
        self
    }

    pub fn set_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn set_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    /// Check value ranges that do not depend on the chosen strategy.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        validate_float_parameter(self.interval_percentile, 0.0, 100.0, "interval_percentile")
    }

    /// Load a configuration from a json string.
    pub fn from_json(json_str: &str) -> Result<Self, CalibrationError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| CalibrationError::UnableToRead(e.to_string()))
    }

    /// Load a configuration from a path to a json file.
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Self, CalibrationError> {
        let json_str = fs::read_to_string(path).map_err(|e| CalibrationError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_defaults_from_json() {
        let config = CalibratorConfig::from_json(r#"{"uncertainty_method": "ensemble"}"#).unwrap();
        assert_eq!(config, CalibratorConfig::new("ensemble"));
        assert_eq!(config.interval_percentile, 95.0);
        assert_eq!(config.regression_calibrator_metric, RegressionCalibratorMetric::Stdev);
        assert_eq!(config.dataset_type, DatasetType::Regression);
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.num_workers, 8);
    }

    #[test]
    fn test_config_full_json() {
        let json = r#"{
            "uncertainty_method": "mve",
            "interval_percentile": 90,
            "regression_calibrator_metric": "interval",
            "dataset_type": "classification",
            "loss_function": "bounded_mse",
            "batch_size": 16,
            "num_workers": 0
        }"#;
        let config = CalibratorConfig::from_json(json).unwrap();
        assert_eq!(config.interval_percentile, 90.0);
        assert_eq!(config.regression_calibrator_metric, RegressionCalibratorMetric::Interval);
        assert_eq!(config.dataset_type, DatasetType::Classification);
        assert_eq!(config.loss_function, "bounded_mse");
    }

    #[test]
    fn test_config_rejects_unknown_metric() {
        let json = r#"{"uncertainty_method": "mve", "regression_calibrator_metric": "variance"}"#;
        assert!(CalibratorConfig::from_json(json).is_err());
    }

    #[test]
    fn test_load_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"uncertainty_method": "ensemble", "interval_percentile": 80}}"#).unwrap();
        let config = CalibratorConfig::load_config(file.path()).unwrap();
        assert_eq!(config.interval_percentile, 80.0);
    }

    #[test]
    fn test_validate_percentile() {
        assert!(CalibratorConfig::new("ensemble").validate().is_ok());
        let config = CalibratorConfig::new("ensemble").set_interval_percentile(0.0);
        assert!(matches!(config.validate(), Err(CalibrationError::InvalidParameter(..))));
        let config = CalibratorConfig::new("ensemble").set_interval_percentile(120.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("zscaling".parse::<CalibrationMethod>().unwrap(), CalibrationMethod::ZScaling);
        assert_eq!("tscaling".parse::<CalibrationMethod>().unwrap(), CalibrationMethod::TScaling);
        assert_eq!(
            "zelikman_interval".parse::<CalibrationMethod>().unwrap(),
            CalibrationMethod::ZelikmanInterval
        );
        let msg = "not_a_method".parse::<CalibrationMethod>().unwrap_err().to_string();
        assert!(msg.contains("not_a_method"));
        for name in CalibrationMethod::SUPPORTED {
            assert!(msg.contains(name));
        }
    }

    #[test]
    fn test_enum_serde_names() {
        assert_eq!(serde_json::to_string(&CalibrationMethod::ZScaling).unwrap(), "\"zscaling\"");
        assert_eq!(
            serde_json::to_string(&CalibrationMethod::ZelikmanInterval).unwrap(),
            "\"zelikman_interval\""
        );
        assert_eq!(serde_json::to_string(&DatasetType::Spectra).unwrap(), "\"spectra\"");
    }

    #[test]
    fn test_display_round_trips_from_str() {
        for m in [RegressionCalibratorMetric::Stdev, RegressionCalibratorMetric::Interval] {
            assert_eq!(m.to_string().parse::<RegressionCalibratorMetric>().unwrap(), m);
        }
        assert_eq!("multiclass".parse::<DatasetType>().unwrap().to_string(), "multiclass");
        assert!("ranking".parse::<DatasetType>().is_err());
    }
}
