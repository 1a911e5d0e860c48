use crate::calibration::tscaling::TScaling;
use crate::calibration::zelikman::ZelikmanInterval;
use crate::calibration::zscaling::ZScaling;
use crate::config::{CalibrationMethod, CalibratorConfig, DatasetType};
use crate::data::{ensure_same_shape, TaskMatrix};
use crate::errors::CalibrationError;
use crate::predictor::{CalibrationDataset, UncertaintyPredictor};
use log::debug;

/// Predictions, variances and targets of a calibration set, all of shape (examples, tasks).
#[derive(Debug, Clone)]
pub struct CalibrationSet {
    preds: TaskMatrix,
    vars: TaskMatrix,
    targets: TaskMatrix,
}

impl CalibrationSet {
    /// Create a calibration set from row-major nested vectors.
    ///
    /// Fails if the shapes differ, if the set is empty, or if any value is
    /// unusable for fitting (non-finite values, variances that are not strictly positive).
    pub fn new(
        preds: &[Vec<f64>],
        vars: &[Vec<f64>],
        targets: &[Vec<f64>],
    ) -> Result<Self, CalibrationError> {
        let preds = TaskMatrix::from_rows(preds, "predictions")?;
        let vars = TaskMatrix::from_rows(vars, "variances")?;
        let targets = TaskMatrix::from_rows(targets, "targets")?;
        ensure_same_shape("variances", &preds, &vars)?;
        ensure_same_shape("targets", &preds, &targets)?;

        if preds.rows == 0 || preds.cols == 0 {
            return Err(CalibrationError::DegenerateData(format!(
                "calibration set of shape {:?} has no values to fit on",
                preds.shape()
            )));
        }
        if preds.values().chain(targets.values()).any(|v| !v.is_finite()) {
            return Err(CalibrationError::DegenerateData(
                "predictions and targets must be finite".to_string(),
            ));
        }
        for j in 0..vars.cols {
            if let Some(i) = vars.get_col(j).iter().position(|v| !(v.is_finite() && *v > 0.0)) {
                return Err(CalibrationError::DegenerateData(format!(
                    "variance {} at example {}, task {} must be finite and positive",
                    vars.get(i, j),
                    i,
                    j
                )));
            }
        }
        Ok(CalibrationSet { preds, vars, targets })
    }

    /// Collect a calibration set from a predictor and the dataset it was built over.
    pub fn from_predictor<P, D>(predictor: &P, dataset: &D) -> Result<Self, CalibrationError>
    where
        P: UncertaintyPredictor,
        D: CalibrationDataset,
    {
        Self::new(
            &predictor.get_uncal_preds(),
            &predictor.get_uncal_vars(),
            &dataset.targets(),
        )
    }

    pub fn num_examples(&self) -> usize {
        self.preds.rows
    }

    pub fn num_tasks(&self) -> usize {
        self.preds.cols
    }

    /// Signed errors `prediction - target` for task `j`.
    pub fn task_errors(&self, j: usize) -> Vec<f64> {
        self.preds
            .get_col(j)
            .iter()
            .zip(self.targets.get_col(j))
            .map(|(p, t)| p - t)
            .collect()
    }

    /// Raw variances for task `j`.
    pub fn task_variances(&self, j: usize) -> &[f64] {
        self.vars.get_col(j)
    }
}

/// A way of turning raw variances into calibrated spreads.
pub trait CalibrationStrategy {
    /// Reject configurations the strategy cannot be fit under.
    fn validate(&self, dataset_type: DatasetType) -> Result<(), CalibrationError>;

    /// Fit the scaling of a single task.
    ///
    /// * `errors` - Signed errors of the calibration examples.
    /// * `variances` - Raw variances of the same examples.
    fn fit_task(&self, errors: &[f64], variances: &[f64]) -> Result<f64, CalibrationError>;

    /// Calibrated spread of one prediction given its raw variance and its task's scaling.
    fn spread(&self, variance: f64, scaling: f64) -> f64;

    /// Reporting label, `{uncertainty_method}_{strategy}_{stdev|<percentile>interval}`.
    fn label(&self, uncertainty_method: &str) -> String;

    /// Fit every task independently, returning one scaling per task.
    ///
    /// Fails if a task has no error to fit on, or if its fitted scaling is
    /// not finite and positive.
    fn fit(&self, set: &CalibrationSet) -> Result<Vec<f64>, CalibrationError> {
        let mut scaling = Vec::with_capacity(set.num_tasks());
        for j in 0..set.num_tasks() {
            let errors = set.task_errors(j);
            if errors.iter().all(|e| *e == 0.0) {
                return Err(CalibrationError::DegenerateData(format!(
                    "task {} has zero error on every calibration example",
                    j
                )));
            }
            let s = self.fit_task(&errors, set.task_variances(j))?;
            if !(s.is_finite() && s > 0.0) {
                return Err(CalibrationError::DegenerateData(format!(
                    "fitted scaling {} for task {} must be finite and positive",
                    s, j
                )));
            }
            debug!("Task {}: scaling {}", j, s);
            scaling.push(s);
        }
        Ok(scaling)
    }
}

pub(crate) fn ensure_regression(strategy: &str, dataset_type: DatasetType) -> Result<(), CalibrationError> {
    if dataset_type != DatasetType::Regression {
        return Err(CalibrationError::IncompatibleDatasetType(
            strategy.to_string(),
            dataset_type.to_string(),
        ));
    }
    Ok(())
}

/// Z-scores `e_i / sqrt(v_i)` scaled by `1 / sqrt(divisor)` on the variance.
pub(crate) fn zscores(errors: &[f64], variances: &[f64], divisor: f64) -> Vec<f64> {
    errors
        .iter()
        .zip(variances)
        .map(|(e, v)| e / (v / divisor).sqrt())
        .collect()
}

/// The closed set of calibration strategies.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    ZScaling(ZScaling),
    TScaling(TScaling),
    ZelikmanInterval(ZelikmanInterval),
}

impl Strategy {
    /// Configure the strategy for `method`.
    ///
    /// * `num_models` - Size of the ensemble the raw variances come from.
    pub fn new(method: CalibrationMethod, config: &CalibratorConfig, num_models: usize) -> Self {
        let metric = config.regression_calibrator_metric;
        let interval_percentile = config.interval_percentile;
        match method {
            CalibrationMethod::ZScaling => Strategy::ZScaling(ZScaling {
                metric,
                interval_percentile,
            }),
            CalibrationMethod::TScaling => Strategy::TScaling(TScaling {
                metric,
                interval_percentile,
                num_models,
            }),
            CalibrationMethod::ZelikmanInterval => Strategy::ZelikmanInterval(ZelikmanInterval {
                metric,
                interval_percentile,
            }),
        }
    }

    pub fn method(&self) -> CalibrationMethod {
        match self {
            Strategy::ZScaling(_) => CalibrationMethod::ZScaling,
            Strategy::TScaling(_) => CalibrationMethod::TScaling,
            Strategy::ZelikmanInterval(_) => CalibrationMethod::ZelikmanInterval,
        }
    }
}

impl CalibrationStrategy for Strategy {
    fn validate(&self, dataset_type: DatasetType) -> Result<(), CalibrationError> {
        match self {
            Strategy::ZScaling(s) => s.validate(dataset_type),
            Strategy::TScaling(s) => s.validate(dataset_type),
            Strategy::ZelikmanInterval(s) => s.validate(dataset_type),
        }
    }

    fn fit_task(&self, errors: &[f64], variances: &[f64]) -> Result<f64, CalibrationError> {
        match self {
            Strategy::ZScaling(s) => s.fit_task(errors, variances),
            Strategy::TScaling(s) => s.fit_task(errors, variances),
            Strategy::ZelikmanInterval(s) => s.fit_task(errors, variances),
        }
    }

    fn spread(&self, variance: f64, scaling: f64) -> f64 {
        match self {
            Strategy::ZScaling(s) => s.spread(variance, scaling),
            Strategy::TScaling(s) => s.spread(variance, scaling),
            Strategy::ZelikmanInterval(s) => s.spread(variance, scaling),
        }
    }

    fn label(&self, uncertainty_method: &str) -> String {
        match self {
            Strategy::ZScaling(s) => s.label(uncertainty_method),
            Strategy::TScaling(s) => s.label(uncertainty_method),
            Strategy::ZelikmanInterval(s) => s.label(uncertainty_method),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_set_errors_per_task() {
        let set = CalibrationSet::new(
            &[vec![1.0, 10.0], vec![2.0, 20.0]],
            &[vec![1.0, 4.0], vec![1.0, 4.0]],
            &[vec![0.5, 12.0], vec![2.5, 19.0]],
        )
        .unwrap();
        assert_eq!(set.num_examples(), 2);
        assert_eq!(set.num_tasks(), 2);
        assert_eq!(set.task_errors(0), vec![0.5, -0.5]);
        assert_eq!(set.task_errors(1), vec![-2.0, 1.0]);
        assert_eq!(set.task_variances(1), &[4.0, 4.0]);
    }

    #[test]
    fn test_calibration_set_shape_mismatch() {
        let err = CalibrationSet::new(&[vec![1.0, 2.0]], &[vec![1.0]], &[vec![1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, CalibrationError::ShapeMismatch(..)));
        let err = CalibrationSet::new(&[vec![1.0]], &[vec![1.0]], &[vec![1.0], vec![2.0]]).unwrap_err();
        assert!(matches!(err, CalibrationError::ShapeMismatch(..)));
    }

    #[test]
    fn test_calibration_set_rejects_degenerate() {
        let err = CalibrationSet::new(&[], &[], &[]).unwrap_err();
        assert!(matches!(err, CalibrationError::DegenerateData(..)));
        let err = CalibrationSet::new(&[vec![1.0], vec![2.0]], &[vec![1.0], vec![0.0]], &[vec![1.0], vec![1.0]])
            .unwrap_err();
        assert!(err.to_string().contains("example 1, task 0"));
        let err = CalibrationSet::new(&[vec![f64::NAN]], &[vec![1.0]], &[vec![1.0]]).unwrap_err();
        assert!(matches!(err, CalibrationError::DegenerateData(..)));
    }

    #[test]
    fn test_strategy_from_method() {
        let config = CalibratorConfig::new("ensemble");
        for method in [
            CalibrationMethod::ZScaling,
            CalibrationMethod::TScaling,
            CalibrationMethod::ZelikmanInterval,
        ] {
            assert_eq!(Strategy::new(method, &config, 5).method(), method);
        }
    }

    #[test]
    fn test_ensure_regression() {
        assert!(ensure_regression("Z Score Scaling", DatasetType::Regression).is_ok());
        let msg = ensure_regression("Z Score Scaling", DatasetType::Spectra)
            .unwrap_err()
            .to_string();
        assert!(msg.contains("Z Score Scaling") && msg.contains("spectra"));
    }
}
