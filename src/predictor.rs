//! Predictor
//!
//! Narrow interfaces to the collaborators that produce raw predictions and
//! variances. The calibrators never see models or features, only what these
//! traits hand back.
use crate::config::DatasetType;
use crate::errors::CalibrationError;

/// Source of uncalibrated predictions and variances, shape (examples, tasks).
pub trait UncertaintyPredictor {
    fn get_uncal_preds(&self) -> Vec<Vec<f64>>;
    fn get_uncal_vars(&self) -> Vec<Vec<f64>>;
}

/// Labelled data a calibrator is fit on.
pub trait CalibrationDataset {
    /// Ground truth values, shape (examples, tasks).
    fn targets(&self) -> Vec<Vec<f64>>;
}

impl CalibrationDataset for Vec<Vec<f64>> {
    fn targets(&self) -> Vec<Vec<f64>> {
        self.clone()
    }
}

/// Settings passed through to a [`PredictorFactory`].
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorOptions {
    pub dataset_type: DatasetType,
    pub batch_size: usize,
    pub num_workers: usize,
    pub loss_function: String,
    pub uncertainty_method: String,
}

/// Builds an [`UncertaintyPredictor`] from a dataset and a model ensemble.
pub trait PredictorFactory {
    type Dataset: CalibrationDataset;
    type Model;
    type Scaler;
    type Predictor: UncertaintyPredictor;

    fn build_predictor(
        &self,
        dataset: &Self::Dataset,
        models: &[Self::Model],
        scalers: &[Self::Scaler],
        options: &PredictorOptions,
    ) -> Result<Self::Predictor, CalibrationError>;
}

/// Predictor over precomputed predictions and variances.
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryPredictor {
    preds: Vec<Vec<f64>>,
    vars: Vec<Vec<f64>>,
}

impl InMemoryPredictor {
    pub fn new(preds: Vec<Vec<f64>>, vars: Vec<Vec<f64>>) -> Self {
        InMemoryPredictor { preds, vars }
    }
}

impl UncertaintyPredictor for InMemoryPredictor {
    fn get_uncal_preds(&self) -> Vec<Vec<f64>> {
        self.preds.clone()
    }
    fn get_uncal_vars(&self) -> Vec<Vec<f64>> {
        self.vars.clone()
    }
}
