//! T Scaling
//!
//! Student-t rescaling of the standard error of an ensemble mean.
use crate::calibration::base::{ensure_regression, zscores, CalibrationStrategy};
use crate::config::{DatasetType, RegressionCalibratorMetric};
use crate::errors::CalibrationError;
use crate::optimize::{minimize_scalar, NelderMeadConfig};
use crate::utils::std_dev;
use log::debug;
use statrs::distribution::{Continuous, ContinuousCDF, StudentsT};

/// Treats the raw variance as the spread of `num_models` ensemble members,
/// so errors normalized by the standard error follow a Student-t with
/// `num_models - 1` degrees of freedom. Fits a per-task factor on that scale.
#[derive(Debug, Clone, PartialEq)]
pub struct TScaling {
    pub metric: RegressionCalibratorMetric,
    pub interval_percentile: f64,
    pub num_models: usize,
}

impl TScaling {
    pub fn degrees_of_freedom(&self) -> f64 {
        self.num_models.saturating_sub(1) as f64
    }

    /// Student-t negative log-likelihood of `errors` with scales `se_i · |s|`.
    pub fn nll(errors: &[f64], std_errors: &[f64], s: f64, df: f64) -> f64 {
        let mut nll = 0.0;
        for (e, se) in errors.iter().zip(std_errors) {
            match StudentsT::new(0.0, se * s.abs(), df) {
                Ok(dist) => nll -= dist.ln_pdf(*e),
                Err(_) => return f64::INFINITY,
            }
        }
        nll
    }

    /// Two-sided Student-t quantile covering `percentile` percent.
    pub fn interval_multiplier(percentile: f64, df: f64) -> Result<f64, CalibrationError> {
        let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| CalibrationError::Distribution(e.to_string()))?;
        Ok(dist.inverse_cdf((percentile / 100.0 + 1.0) / 2.0))
    }
}

impl CalibrationStrategy for TScaling {
    fn validate(&self, dataset_type: DatasetType) -> Result<(), CalibrationError> {
        ensure_regression("T Score Scaling", dataset_type)?;
        if self.num_models <= 1 {
            return Err(CalibrationError::InvalidParameter(
                "num_models".to_string(),
                "more than 1 model for T Score Scaling".to_string(),
                self.num_models.to_string(),
            ));
        }
        Ok(())
    }

    fn fit_task(&self, errors: &[f64], variances: &[f64]) -> Result<f64, CalibrationError> {
        let df = self.degrees_of_freedom();
        // Bessel-corrected standard error of the ensemble mean.
        let std_errors: Vec<f64> = variances.iter().map(|v| (v / df).sqrt()).collect();
        let initial_guess = std_dev(&zscores(errors, variances, df));
        let sol = minimize_scalar(
            |s| Self::nll(errors, &std_errors, s, df),
            initial_guess,
            &NelderMeadConfig::default(),
        );
        debug!(
            "tscaling: df {}, start {:.4}, optimum {:.4} (nll {:.4}) after {} iterations, {} evaluations",
            df, initial_guess, sol.x[0], sol.fun, sol.iterations, sol.evaluations
        );
        let stdev_scaling = sol.x[0].abs();
        Ok(match self.metric {
            RegressionCalibratorMetric::Stdev => stdev_scaling,
            RegressionCalibratorMetric::Interval => {
                stdev_scaling * Self::interval_multiplier(self.interval_percentile, df)?
            }
        })
    }

    fn spread(&self, variance: f64, scaling: f64) -> f64 {
        (variance / self.degrees_of_freedom()).sqrt() * scaling
    }

    fn label(&self, uncertainty_method: &str) -> String {
        match self.metric {
            RegressionCalibratorMetric::Stdev => format!("{}_tscaling_stdev", uncertainty_method),
            RegressionCalibratorMetric::Interval => {
                format!("{}_tscaling_{}interval", uncertainty_method, self.interval_percentile)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaler(metric: RegressionCalibratorMetric, num_models: usize) -> TScaling {
        TScaling {
            metric,
            interval_percentile: 95.0,
            num_models,
        }
    }

    #[test]
    fn test_validate_requires_ensemble() {
        let single = scaler(RegressionCalibratorMetric::Stdev, 1);
        let err = single.validate(DatasetType::Regression).unwrap_err();
        assert!(matches!(err, CalibrationError::InvalidParameter(..)));
        assert!(err.to_string().contains("num_models"));
        assert!(scaler(RegressionCalibratorMetric::Stdev, 0)
            .validate(DatasetType::Regression)
            .is_err());
        assert!(scaler(RegressionCalibratorMetric::Stdev, 2)
            .validate(DatasetType::Regression)
            .is_ok());
    }

    #[test]
    fn test_validate_dataset_type_first() {
        let err = scaler(RegressionCalibratorMetric::Stdev, 1)
            .validate(DatasetType::Multiclass)
            .unwrap_err();
        assert!(matches!(err, CalibrationError::IncompatibleDatasetType(..)));
    }

    #[test]
    fn test_nll_is_infinite_at_zero_scale() {
        assert_eq!(TScaling::nll(&[1.0], &[1.0], 0.0, 4.0), f64::INFINITY);
        assert!(TScaling::nll(&[1.0], &[1.0], 1.0, 4.0).is_finite());
    }

    #[test]
    fn test_interval_multiplier() {
        // t quantile at 0.975 with 4 degrees of freedom.
        let q = TScaling::interval_multiplier(95.0, 4.0).unwrap();
        assert!((q - 2.776445).abs() < 1e-4, "quantile {}", q);
        assert!(TScaling::interval_multiplier(95.0, 0.0).is_err());
    }

    #[test]
    fn test_fit_task_interval_is_stdev_times_quantile() {
        let errors = [0.3, -0.8, 1.2, -0.1, 0.6, -1.5, 0.9, -0.4];
        let variances = [1.0, 2.0, 1.5, 0.5, 1.0, 3.0, 2.0, 1.0];
        let stdev = scaler(RegressionCalibratorMetric::Stdev, 5)
            .fit_task(&errors, &variances)
            .unwrap();
        let interval = scaler(RegressionCalibratorMetric::Interval, 5)
            .fit_task(&errors, &variances)
            .unwrap();
        let q = TScaling::interval_multiplier(95.0, 4.0).unwrap();
        assert!(stdev > 0.0);
        assert!((interval - stdev * q).abs() < 1e-9);
    }

    #[test]
    fn test_spread_uses_standard_error() {
        let t = scaler(RegressionCalibratorMetric::Stdev, 5);
        assert!((t.spread(16.0, 2.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_labels() {
        assert_eq!(
            scaler(RegressionCalibratorMetric::Stdev, 5).label("ensemble"),
            "ensemble_tscaling_stdev"
        );
        assert_eq!(
            scaler(RegressionCalibratorMetric::Interval, 5).label("ensemble"),
            "ensemble_tscaling_95interval"
        );
    }
}
