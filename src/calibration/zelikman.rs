//! Zelikman Interval
//!
//! Distribution-free interval scaling from the empirical quantile of
//! absolute z-scores.
use crate::calibration::base::{ensure_regression, zscores, CalibrationStrategy};
use crate::config::{DatasetType, RegressionCalibratorMetric};
use crate::errors::CalibrationError;
use crate::utils::percentile;
use log::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct ZelikmanInterval {
    /// Only interval calibration is produced, whatever this says.
    pub metric: RegressionCalibratorMetric,
    pub interval_percentile: f64,
}

impl CalibrationStrategy for ZelikmanInterval {
    fn validate(&self, dataset_type: DatasetType) -> Result<(), CalibrationError> {
        ensure_regression("Zelikman Interval Scaling", dataset_type)?;
        if self.metric == RegressionCalibratorMetric::Stdev {
            warn!(
                "Zelikman interval scaling ignores the stdev metric, spreads are {}% interval half-widths.",
                self.interval_percentile
            );
        }
        Ok(())
    }

    fn fit_task(&self, errors: &[f64], variances: &[f64]) -> Result<f64, CalibrationError> {
        let abs_zscores: Vec<f64> = zscores(errors, variances, 1.0).iter().map(|z| z.abs()).collect();
        Ok(percentile(&abs_zscores, self.interval_percentile))
    }

    fn spread(&self, variance: f64, scaling: f64) -> f64 {
        variance.sqrt() * scaling
    }

    fn label(&self, uncertainty_method: &str) -> String {
        format!("{}_zelikman_{}interval", uncertainty_method, self.interval_percentile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaler(interval_percentile: f64) -> ZelikmanInterval {
        ZelikmanInterval {
            metric: RegressionCalibratorMetric::Interval,
            interval_percentile,
        }
    }

    #[test]
    fn test_fit_task_is_percentile_of_abs_zscores() {
        // |z| = 1, 2, 3, 4, 5
        let errors = [-1.0, 4.0, 3.0, -8.0, 5.0];
        let variances = [1.0, 4.0, 1.0, 4.0, 1.0];
        assert_eq!(scaler(50.0).fit_task(&errors, &variances).unwrap(), 3.0);
        assert!((scaler(90.0).fit_task(&errors, &variances).unwrap() - 4.6).abs() < 1e-12);
    }

    #[test]
    fn test_label_ignores_metric() {
        let z = ZelikmanInterval {
            metric: RegressionCalibratorMetric::Stdev,
            interval_percentile: 80.0,
        };
        assert_eq!(z.label("dropout"), "dropout_zelikman_80interval");
        assert!(z.validate(DatasetType::Regression).is_ok());
    }

    #[test]
    fn test_validate_rejects_classification() {
        assert!(scaler(95.0).validate(DatasetType::Classification).is_err());
    }
}
