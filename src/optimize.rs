//! Optimize
//!
//! Derivative-free minimization with the Nelder-Mead downhill simplex.
use log::warn;
use std::cmp::Ordering;

const RHO: f64 = 1.0;
const CHI: f64 = 2.0;
const PSI: f64 = 0.5;
const SIGMA: f64 = 0.5;
const NONZDELT: f64 = 0.05;
const ZDELT: f64 = 0.00025;

/// Stopping criteria for [`nelder_mead`].
#[derive(Debug, Clone, Copy)]
pub struct NelderMeadConfig {
    /// Absolute spread of the simplex vertices accepted for convergence.
    pub xatol: f64,
    /// Absolute spread of the objective values accepted for convergence.
    pub fatol: f64,
    /// Iteration limit, `None` means `200 * dimensions`.
    pub max_iter: Option<usize>,
    /// Objective evaluation limit, `None` means `200 * dimensions`.
    pub max_fun: Option<usize>,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        NelderMeadConfig {
            xatol: 1e-4,
            fatol: 1e-4,
            max_iter: None,
            max_fun: None,
        }
    }
}

/// Outcome of a minimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// Best point found.
    pub x: Vec<f64>,
    /// Objective at `x`.
    pub fun: f64,
    pub iterations: usize,
    pub evaluations: usize,
    /// False if a limit was hit before the tolerances were met.
    pub converged: bool,
}

/// Minimize `f` starting from `x0`.
///
/// Non-finite objective values are treated as `+inf`, so the simplex moves
/// away from regions where the objective is undefined.
pub fn nelder_mead<F>(mut f: F, x0: &[f64], config: &NelderMeadConfig) -> NelderMeadResult
where
    F: FnMut(&[f64]) -> f64,
{
    let n = x0.len();
    let max_iter = config.max_iter.unwrap_or(200 * n);
    let max_fun = config.max_fun.unwrap_or(200 * n);
    let mut evaluations = 0;
    let mut eval = |x: &[f64], count: &mut usize| {
        *count += 1;
        let v = f(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    let mut sim: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    sim.push(x0.to_vec());
    for k in 0..n {
        let mut y = x0.to_vec();
        y[k] = if y[k] != 0.0 { (1.0 + NONZDELT) * y[k] } else { ZDELT };
        sim.push(y);
    }
    let mut fsim: Vec<f64> = sim.iter().map(|x| eval(x, &mut evaluations)).collect();
    sort_simplex(&mut sim, &mut fsim);

    let mut iterations = 1;
    let mut converged = false;
    while evaluations < max_fun && iterations < max_iter {
        let x_spread = sim[1..]
            .iter()
            .flat_map(|v| v.iter().zip(&sim[0]).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max);
        let f_spread = fsim[1..].iter().map(|v| (fsim[0] - v).abs()).fold(0.0, f64::max);
        if x_spread <= config.xatol && f_spread <= config.fatol {
            converged = true;
            break;
        }

        let xbar: Vec<f64> = (0..n)
            .map(|j| sim[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
            .collect();
        let worst = sim[n].clone();
        let along = |coef: f64| -> Vec<f64> {
            xbar.iter()
                .zip(&worst)
                .map(|(b, w)| (1.0 + coef) * b - coef * w)
                .collect()
        };

        let xr = along(RHO);
        let fxr = eval(&xr, &mut evaluations);
        let mut shrink = false;
        if fxr < fsim[0] {
            let xe = along(RHO * CHI);
            let fxe = eval(&xe, &mut evaluations);
            if fxe < fxr {
                sim[n] = xe;
                fsim[n] = fxe;
            } else {
                sim[n] = xr;
                fsim[n] = fxr;
            }
        } else if fxr < fsim[n - 1] {
            sim[n] = xr;
            fsim[n] = fxr;
        } else if fxr < fsim[n] {
            // Outside contraction.
            let xc = along(PSI * RHO);
            let fxc = eval(&xc, &mut evaluations);
            if fxc <= fxr {
                sim[n] = xc;
                fsim[n] = fxc;
            } else {
                shrink = true;
            }
        } else {
            // Inside contraction.
            let xcc = along(-PSI);
            let fxcc = eval(&xcc, &mut evaluations);
            if fxcc < fsim[n] {
                sim[n] = xcc;
                fsim[n] = fxcc;
            } else {
                shrink = true;
            }
        }

        if shrink {
            for j in 1..=n {
                let shrunk: Vec<f64> = sim[0]
                    .iter()
                    .zip(&sim[j])
                    .map(|(b, v)| b + SIGMA * (v - b))
                    .collect();
                fsim[j] = eval(&shrunk, &mut evaluations);
                sim[j] = shrunk;
            }
        }
        sort_simplex(&mut sim, &mut fsim);
        iterations += 1;
    }

    if !converged {
        warn!(
            "Nelder-Mead stopped after {} iterations and {} evaluations without meeting tolerances.",
            iterations, evaluations
        );
    }
    NelderMeadResult {
        x: sim.swap_remove(0),
        fun: fsim[0],
        iterations,
        evaluations,
        converged,
    }
}

/// Minimize a function of one variable.
pub fn minimize_scalar<F>(mut f: F, x0: f64, config: &NelderMeadConfig) -> NelderMeadResult
where
    F: FnMut(f64) -> f64,
{
    nelder_mead(|x| f(x[0]), &[x0], config)
}

fn sort_simplex(sim: &mut Vec<Vec<f64>>, fsim: &mut Vec<f64>) {
    let mut order: Vec<usize> = (0..fsim.len()).collect();
    order.sort_by(|&a, &b| fsim[a].partial_cmp(&fsim[b]).unwrap_or(Ordering::Equal));
    *sim = order.iter().map(|&i| sim[i].clone()).collect();
    *fsim = order.iter().map(|&i| fsim[i]).collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimize_parabola() {
        let res = minimize_scalar(|x| (x - 3.0).powi(2) + 1.0, 0.5, &NelderMeadConfig::default());
        assert!(res.converged);
        assert!((res.x[0] - 3.0).abs() < 1e-3);
        assert!((res.fun - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_minimize_from_zero_start() {
        let res = minimize_scalar(|x| (x + 0.2).powi(2), 0.0, &NelderMeadConfig::default());
        assert!((res.x[0] + 0.2).abs() < 1e-3);
    }

    #[test]
    fn test_minimize_rosenbrock() {
        let rosen = |x: &[f64]| 100.0 * (x[1] - x[0] * x[0]).powi(2) + (1.0 - x[0]).powi(2);
        let config = NelderMeadConfig {
            xatol: 1e-8,
            fatol: 1e-8,
            max_iter: Some(5000),
            max_fun: Some(5000),
        };
        let res = nelder_mead(rosen, &[-1.2, 1.0], &config);
        assert!(res.converged);
        assert!((res.x[0] - 1.0).abs() < 1e-3);
        assert!((res.x[1] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_non_finite_region_is_avoided() {
        // Undefined for x <= 0, minimum at x = 1.
        let res = minimize_scalar(|x| x - x.ln(), 0.1, &NelderMeadConfig::default());
        assert!((res.x[0] - 1.0).abs() < 1e-2);
    }

    #[test]
    fn test_iteration_limit_reported() {
        let config = NelderMeadConfig {
            max_iter: Some(3),
            ..Default::default()
        };
        let res = minimize_scalar(|x| (x - 100.0).powi(2), 1.0, &config);
        assert!(!res.converged);
        assert_eq!(res.iterations, 3);
    }
}
