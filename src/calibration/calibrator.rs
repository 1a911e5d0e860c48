use crate::calibration::base::{CalibrationSet, CalibrationStrategy, Strategy};
use crate::config::{CalibrationMethod, CalibratorConfig, DatasetType, RegressionCalibratorMetric};
use crate::data::{ensure_same_shape, TaskMatrix};
use crate::errors::CalibrationError;
use crate::predictor::{PredictorFactory, PredictorOptions, UncertaintyPredictor};
use crate::utils::fmt_vec_output;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A fitted uncertainty calibrator.
///
/// Construction validates the configuration, builds the calibration
/// predictor and fits one scaling per task. Once built, a calibrator is only
/// read from, so it can be shared freely between threads applying it.
///
/// The strategy and label are derived from `method`, `config` and
/// `num_models`, and only those plus the scaling are persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CalibratorState", into = "CalibratorState")]
pub struct Calibrator {
    config: CalibratorConfig,
    method: CalibrationMethod,
    num_models: usize,
    label: String,
    scaling: Vec<f64>,
}

/// Persisted form of a [`Calibrator`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CalibratorState {
    config: CalibratorConfig,
    method: CalibrationMethod,
    num_models: usize,
    scaling: Vec<f64>,
}

impl From<Calibrator> for CalibratorState {
    fn from(calibrator: Calibrator) -> Self {
        CalibratorState {
            config: calibrator.config,
            method: calibrator.method,
            num_models: calibrator.num_models,
            scaling: calibrator.scaling,
        }
    }
}

impl TryFrom<CalibratorState> for Calibrator {
    type Error = CalibrationError;

    /// Rerun the construction checks on a loaded calibrator.
    fn try_from(state: CalibratorState) -> Result<Self, Self::Error> {
        let strategy = validated_strategy(state.method, &state.config, state.num_models)?;
        if state.scaling.is_empty() || state.scaling.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(CalibrationError::InvalidParameter(
                "scaling".to_string(),
                "one finite, positive value per task".to_string(),
                format!("[{}]", fmt_vec_output(&state.scaling)),
            ));
        }
        Ok(Calibrator {
            label: strategy.label(&state.config.uncertainty_method),
            config: state.config,
            method: state.method,
            num_models: state.num_models,
            scaling: state.scaling,
        })
    }
}

/// Configure the strategy for `method` and check it can be used under `config`.
fn validated_strategy(
    method: CalibrationMethod,
    config: &CalibratorConfig,
    num_models: usize,
) -> Result<Strategy, CalibrationError> {
    let strategy = Strategy::new(method, config, num_models);
    config.validate()?;
    strategy.validate(config.dataset_type)?;
    Ok(strategy)
}

impl Calibrator {
    /// Validate, build the calibration predictor through `factory`, and fit.
    ///
    /// * `method` - Strategy to fit.
    /// * `config` - Calibration settings; the predictor settings in it are passed to `factory` untouched.
    /// * `calibration_data` - Held-out labelled data.
    /// * `models` - The ensemble, its length is the number of models.
    /// * `scalers` - Per-model output scalers.
    /// * `factory` - Builds the uncertainty predictor over `calibration_data`.
    pub fn new<F: PredictorFactory>(
        method: CalibrationMethod,
        config: &CalibratorConfig,
        calibration_data: &F::Dataset,
        models: &[F::Model],
        scalers: &[F::Scaler],
        factory: &F,
    ) -> Result<Self, CalibrationError> {
        let strategy = validated_strategy(method, config, models.len())?;

        let options = PredictorOptions {
            dataset_type: config.dataset_type,
            batch_size: config.batch_size,
            num_workers: config.num_workers,
            loss_function: config.loss_function.clone(),
            uncertainty_method: config.uncertainty_method.clone(),
        };
        let predictor = factory.build_predictor(calibration_data, models, scalers, &options)?;
        let set = CalibrationSet::from_predictor(&predictor, calibration_data)?;
        Self::fit_validated(strategy, config, models.len(), &set)
    }

    /// Fit on predictions and variances that were already computed.
    ///
    /// * `num_models` - Size of the ensemble behind the variances.
    pub fn from_calibration_set(
        method: CalibrationMethod,
        config: &CalibratorConfig,
        num_models: usize,
        set: &CalibrationSet,
    ) -> Result<Self, CalibrationError> {
        let strategy = validated_strategy(method, config, num_models)?;
        Self::fit_validated(strategy, config, num_models, set)
    }

    fn fit_validated(
        strategy: Strategy,
        config: &CalibratorConfig,
        num_models: usize,
        set: &CalibrationSet,
    ) -> Result<Self, CalibrationError> {
        let scaling = strategy.fit(set)?;
        let label = strategy.label(&config.uncertainty_method);
        info!(
            "Fitted {} on {} examples, scaling: [{}]",
            label,
            set.num_examples(),
            fmt_vec_output(&scaling)
        );
        Ok(Calibrator {
            config: config.clone(),
            method: strategy.method(),
            num_models,
            label,
            scaling,
        })
    }

    /// Calibrate the output of a predictor built over new data.
    ///
    /// Returns the predictions unchanged and the calibrated spread of each
    /// prediction, both of shape (examples, tasks).
    #[allow(clippy::type_complexity)]
    pub fn apply<P: UncertaintyPredictor>(
        &self,
        predictor: &P,
    ) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>), CalibrationError> {
        let preds = predictor.get_uncal_preds();
        let vars = TaskMatrix::from_rows(&predictor.get_uncal_vars(), "variances")?;
        ensure_same_shape("variances", &TaskMatrix::from_rows(&preds, "predictions")?, &vars)?;
        if vars.rows > 0 && vars.cols != self.scaling.len() {
            return Err(CalibrationError::ShapeMismatch(
                "evaluation tasks".to_string(),
                format!("{} tasks", self.scaling.len()),
                format!("{} tasks", vars.cols),
            ));
        }
        let strategy = self.strategy();
        let spreads: Vec<Vec<f64>> = (0..vars.rows)
            .map(|i| {
                self.scaling
                    .iter()
                    .enumerate()
                    .map(|(j, s)| strategy.spread(*vars.get(i, j), *s))
                    .collect()
            })
            .collect();
        Ok((preds, spreads))
    }

    /// `{uncertainty_method}_{strategy}_{stdev|<percentile>interval}`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Fitted scaling, one value per task.
    pub fn scaling(&self) -> &[f64] {
        &self.scaling
    }

    pub fn method(&self) -> CalibrationMethod {
        self.method
    }

    pub fn strategy(&self) -> Strategy {
        Strategy::new(self.method, &self.config, self.num_models)
    }

    /// Size of the ensemble the calibrator was fit for.
    pub fn num_models(&self) -> usize {
        self.num_models
    }

    pub fn config(&self) -> &CalibratorConfig {
        &self.config
    }
}

/// Resolve the calibration method, falling back to the default for the dataset type.
///
/// Regression datasets default to z-scaling for the `stdev` metric and to
/// Zelikman intervals otherwise.
pub fn resolve_method(
    method: Option<&str>,
    dataset_type: DatasetType,
    metric: RegressionCalibratorMetric,
) -> Result<CalibrationMethod, CalibrationError> {
    match method {
        Some(name) => name.parse(),
        None => match (dataset_type, metric) {
            (DatasetType::Regression, RegressionCalibratorMetric::Stdev) => Ok(CalibrationMethod::ZScaling),
            (DatasetType::Regression, RegressionCalibratorMetric::Interval) => {
                Ok(CalibrationMethod::ZelikmanInterval)
            }
            (other, _) => Err(CalibrationError::NoDefaultCalibrator(other.to_string())),
        },
    }
}

/// Build a fitted calibrator.
///
/// * `method` - One of `zscaling`, `tscaling`, `zelikman_interval`, or `None` for the default.
/// * `config` - Calibration and predictor settings.
/// * `calibration_data` - Held-out labelled data.
/// * `models` - The model ensemble.
/// * `scalers` - Per-model output scalers.
/// * `factory` - Builds uncertainty predictors.
pub fn build<F: PredictorFactory>(
    method: Option<&str>,
    config: &CalibratorConfig,
    calibration_data: &F::Dataset,
    models: &[F::Model],
    scalers: &[F::Scaler],
    factory: &F,
) -> Result<Calibrator, CalibrationError> {
    let method = resolve_method(method, config.dataset_type, config.regression_calibrator_metric)?;
    info!("Calibrating {} uncertainty with {}.", config.uncertainty_method, method);
    Calibrator::new(method, config, calibration_data, models, scalers, factory)
}

/// IO
pub trait CalibratorIO: Serialize + DeserializeOwned + Sized {
    /// Save a calibrator as a json object to a file.
    ///
    /// * `path` - Path to save calibrator.
    fn save_calibrator<P: AsRef<Path>>(&self, path: P) -> Result<(), CalibrationError> {
        fs::write(path, self.json_dump()?).map_err(|e| CalibrationError::UnableToWrite(e.to_string()))
    }

    /// Dump a calibrator as a json object
    fn json_dump(&self) -> Result<String, CalibrationError> {
        serde_json::to_string(self).map_err(|e| CalibrationError::UnableToWrite(e.to_string()))
    }

    /// Load a calibrator from Json string
    ///
    /// * `json_str` - String object, which can be serialized to json.
    fn from_json(json_str: &str) -> Result<Self, CalibrationError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| CalibrationError::UnableToRead(e.to_string()))
    }

    /// Load a calibrator from a path to a json calibrator object.
    ///
    /// * `path` - Path to load calibrator from.
    fn load_calibrator<P: AsRef<Path>>(path: P) -> Result<Self, CalibrationError> {
        let json_str = fs::read_to_string(path).map_err(|e| CalibrationError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }
}

impl CalibratorIO for Calibrator {}
