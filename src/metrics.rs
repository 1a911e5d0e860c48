//! Metrics
//!
//! Diagnostics for judging calibrated spreads against held-out targets, one
//! task at a time.
use statrs::function::erf::erf_inv;
use std::f64::consts::{PI, SQRT_2};

/// Fraction of examples whose absolute error is within `half_width`.
pub fn coverage(y: &[f64], yhat: &[f64], half_width: &[f64]) -> f64 {
    let covered = y
        .iter()
        .zip(yhat)
        .zip(half_width)
        .filter(|((y_, yhat_), w_)| (*y_ - *yhat_).abs() <= **w_)
        .count();
    covered as f64 / y.len() as f64
}

/// Mean Gaussian negative log-likelihood of the targets.
pub fn gaussian_nll(y: &[f64], yhat: &[f64], stdev: &[f64]) -> f64 {
    let res = y
        .iter()
        .zip(yhat)
        .zip(stdev)
        .map(|((y_, yhat_), s_)| {
            let var = s_ * s_;
            (2.0 * PI * var).ln() / 2.0 + (y_ - yhat_).powi(2) / (2.0 * var)
        })
        .sum::<f64>();
    res / y.len() as f64
}

/// Mean absolute gap between expected and observed coverage of Gaussian
/// intervals built from `stdev`, over 101 evenly spaced levels in [0, 1].
///
/// Zero for perfectly calibrated spreads, at most 0.5.
pub fn miscalibration_area(y: &[f64], yhat: &[f64], stdev: &[f64]) -> f64 {
    let levels = 101;
    let abs_z: Vec<f64> = y
        .iter()
        .zip(yhat)
        .zip(stdev)
        .map(|((y_, yhat_), s_)| (y_ - yhat_).abs() / s_)
        .collect();
    let gap = (0..levels)
        .map(|k| {
            let expected = k as f64 / (levels - 1) as f64;
            let bound = erf_inv(expected) * SQRT_2;
            let observed = abs_z.iter().filter(|z| **z <= bound).count() as f64 / abs_z.len() as f64;
            (observed - expected).abs()
        })
        .sum::<f64>();
    gap / levels as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    #[test]
    fn test_coverage() {
        let y = vec![1.0, 2.0, 3.0, 4.0];
        let yhat = vec![1.5, 2.0, 1.0, 4.2];
        let w = vec![1.0, 0.1, 1.0, 0.1];
        assert_eq!(coverage(&y, &yhat, &w), 0.5);
    }

    #[test]
    fn test_gaussian_nll() {
        let nll = gaussian_nll(&[0.0], &[0.0], &[1.0]);
        assert!((nll - (2.0 * PI).ln() / 2.0).abs() < 1e-12);
        assert!(gaussian_nll(&[2.0], &[0.0], &[1.0]) > nll);
    }

    #[test]
    fn test_miscalibration_area() {
        let mut rng = StdRng::seed_from_u64(0);
        let normal = Normal::new(0.0, 2.0).unwrap();
        let y: Vec<f64> = (0..5000).map(|_| normal.sample(&mut rng)).collect();
        let yhat = vec![0.0; y.len()];
        let calibrated = miscalibration_area(&y, &yhat, &vec![2.0; y.len()]);
        let overconfident = miscalibration_area(&y, &yhat, &vec![0.5; y.len()]);
        assert!(calibrated < 0.02, "area {}", calibrated);
        assert!(overconfident > 0.2, "area {}", overconfident);
    }
}
