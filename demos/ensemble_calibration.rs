//! Fit each calibrator on a toy ensemble whose raw variances are too narrow,
//! then compare interval coverage on fresh data before and after calibration.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::error::Error;
use uncal::metrics::{coverage, miscalibration_area};
use uncal::{
    build, CalibrationDataset, CalibrationError, CalibratorConfig, DatasetType, InMemoryPredictor, PredictorFactory,
    PredictorOptions, RegressionCalibratorMetric, UncertaintyPredictor,
};

struct Dataset {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Dataset {
    fn sample(n: usize, rng: &mut StdRng) -> Self {
        let noise = Normal::new(0.0, 1.0).unwrap();
        let x: Vec<f64> = (0..n).map(|_| rng.gen_range(0.0..4.0)).collect();
        let y = x
            .iter()
            .map(|x| x.sin() * 3.0 + noise.sample(rng) * (0.2 + 0.3 * x))
            .collect();
        Dataset { x, y }
    }
}

impl CalibrationDataset for Dataset {
    fn targets(&self) -> Vec<Vec<f64>> {
        self.y.iter().map(|y| vec![*y]).collect()
    }
}

/// A member predicts `amplitude * sin(x) + slope * x`.
struct Member {
    amplitude: f64,
    slope: f64,
}

struct Ensemble;

impl PredictorFactory for Ensemble {
    type Dataset = Dataset;
    type Model = Member;
    type Scaler = ();
    type Predictor = InMemoryPredictor;

    fn build_predictor(
        &self,
        dataset: &Dataset,
        models: &[Member],
        _scalers: &[()],
        _options: &PredictorOptions,
    ) -> Result<InMemoryPredictor, CalibrationError> {
        let n = models.len() as f64;
        let mut preds = Vec::with_capacity(dataset.x.len());
        let mut vars = Vec::with_capacity(dataset.x.len());
        for x in &dataset.x {
            let member: Vec<f64> = models.iter().map(|m| m.amplitude * x.sin() + m.slope * x).collect();
            let mean = member.iter().sum::<f64>() / n;
            let var = member.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
            preds.push(vec![mean]);
            vars.push(vec![var]);
        }
        Ok(InMemoryPredictor::new(preds, vars))
    }
}

fn column(m: &[Vec<f64>]) -> Vec<f64> {
    m.iter().map(|r| r[0]).collect()
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let mut rng = StdRng::seed_from_u64(42);
    let models: Vec<Member> = (0..5)
        .map(|_| Member {
            amplitude: rng.gen_range(2.8..3.2),
            slope: rng.gen_range(-0.05..0.05),
        })
        .collect();
    let scalers = vec![(); models.len()];
    let calibration = Dataset::sample(1000, &mut rng);
    let test = Dataset::sample(1000, &mut rng);

    let options = PredictorOptions {
        dataset_type: DatasetType::Regression,
        batch_size: 50,
        num_workers: 0,
        loss_function: "mse".to_string(),
        uncertainty_method: "ensemble".to_string(),
    };
    let test_predictor = Ensemble.build_predictor(&test, &models, &scalers, &options)?;
    let test_preds = column(&test_predictor.get_uncal_preds());
    let raw_sd: Vec<f64> = column(&test_predictor.get_uncal_vars()).iter().map(|v| v.sqrt()).collect();
    let raw_half_width: Vec<f64> = raw_sd.iter().map(|s| s * 1.96).collect();
    println!(
        "uncalibrated: miscalibration area {:.3}, 95% coverage {:.3}",
        miscalibration_area(&test.y, &test_preds, &raw_sd),
        coverage(&test.y, &test_preds, &raw_half_width)
    );

    let stdev_config = CalibratorConfig::new("ensemble");
    let calibrator = build(None, &stdev_config, &calibration, &models[..], &scalers[..], &Ensemble)?;
    let (_, stdev) = calibrator.apply(&test_predictor)?;
    println!(
        "{}: miscalibration area {:.3}",
        calibrator.label(),
        miscalibration_area(&test.y, &test_preds, &column(&stdev))
    );

    let interval_config =
        CalibratorConfig::new("ensemble").set_regression_calibrator_metric(RegressionCalibratorMetric::Interval);
    for method in ["zscaling", "tscaling", "zelikman_interval"] {
        let calibrator = build(Some(method), &interval_config, &calibration, &models[..], &scalers[..], &Ensemble)?;
        let (preds, half_width) = calibrator.apply(&test_predictor)?;
        println!(
            "{}: scaling {:.3}, 95% coverage {:.3}",
            calibrator.label(),
            calibrator.scaling()[0],
            coverage(&test.y, &column(&preds), &column(&half_width))
        );
    }
    Ok(())
}
