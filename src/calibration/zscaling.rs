//! Z Scaling
//!
//! Gaussian rescaling of raw standard deviations.
use crate::calibration::base::{ensure_regression, zscores, CalibrationStrategy};
use crate::config::{DatasetType, RegressionCalibratorMetric};
use crate::errors::CalibrationError;
use crate::optimize::{minimize_scalar, NelderMeadConfig};
use crate::utils::std_dev;
use log::debug;
use statrs::function::erf::erf_inv;
use std::f64::consts::{PI, SQRT_2};

/// Assumes each task's errors are zero-mean Gaussian with variance `s² · v_i`
/// and fits `s` by maximum likelihood.
#[derive(Debug, Clone, PartialEq)]
pub struct ZScaling {
    pub metric: RegressionCalibratorMetric,
    pub interval_percentile: f64,
}

impl ZScaling {
    /// Gaussian negative log-likelihood of `errors` with variances `s² · v_i`.
    pub fn nll(errors: &[f64], variances: &[f64], s: f64) -> f64 {
        errors
            .iter()
            .zip(variances)
            .map(|(e, v)| {
                let scaled_var = v * s * s;
                (2.0 * PI * scaled_var).ln() / 2.0 + e * e / (2.0 * scaled_var)
            })
            .sum()
    }

    /// Number of standard deviations covering `percentile` percent of a Gaussian, two-sided.
    pub fn interval_multiplier(percentile: f64) -> f64 {
        erf_inv(percentile / 100.0) * SQRT_2
    }
}

impl CalibrationStrategy for ZScaling {
    fn validate(&self, dataset_type: DatasetType) -> Result<(), CalibrationError> {
        ensure_regression("Z Score Scaling", dataset_type)
    }

    fn fit_task(&self, errors: &[f64], variances: &[f64]) -> Result<f64, CalibrationError> {
        let initial_guess = std_dev(&zscores(errors, variances, 1.0));
        let sol = minimize_scalar(
            |s| Self::nll(errors, variances, s),
            initial_guess,
            &NelderMeadConfig::default(),
        );
        debug!(
            "zscaling: start {:.4}, optimum {:.4} (nll {:.4}) after {} iterations, {} evaluations",
            initial_guess, sol.x[0], sol.fun, sol.iterations, sol.evaluations
        );
        // The likelihood only depends on s².
        let stdev_scaling = sol.x[0].abs();
        Ok(match self.metric {
            RegressionCalibratorMetric::Stdev => stdev_scaling,
            RegressionCalibratorMetric::Interval => {
                stdev_scaling * Self::interval_multiplier(self.interval_percentile)
            }
        })
    }

    fn spread(&self, variance: f64, scaling: f64) -> f64 {
        variance.sqrt() * scaling
    }

    fn label(&self, uncertainty_method: &str) -> String {
        match self.metric {
            RegressionCalibratorMetric::Stdev => format!("{}_zscaling_stdev", uncertainty_method),
            RegressionCalibratorMetric::Interval => {
                format!("{}_zscaling_{}interval", uncertainty_method, self.interval_percentile)
            }
        }
    }
}
