//! Calibration Module
//!
//! Fits per-task corrections that turn raw, mis-scaled regression variances
//! into calibrated standard deviations or interval half-widths.
//!
//! # Submodules
//!
//! * `base`: The calibration set, the `CalibrationStrategy` trait and the closed `Strategy` set.
//! * `calibrator`: The fitted `Calibrator`, the `build` selector and JSON persistence.
//! * `zscaling`: Gaussian maximum-likelihood rescaling.
//! * `tscaling`: Student-t maximum-likelihood rescaling for finite ensembles.
//! * `zelikman`: Empirical quantile of absolute z-scores.

pub mod base;
pub mod calibrator;
pub mod tscaling;
pub mod zelikman;
pub mod zscaling;

pub use base::{CalibrationSet, CalibrationStrategy, Strategy};
pub use calibrator::{build, resolve_method, Calibrator, CalibratorIO};
