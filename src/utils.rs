use crate::errors::CalibrationError;
use std::cmp::Ordering;

/// Create a string of all available items.
pub fn items_to_strings(items: &[&str]) -> String {
    items.join(", ")
}

/// Format a slice of floats for log messages.
pub fn fmt_vec_output(v: &[f64]) -> String {
    v.iter().map(|x| format!("{:.4}", x)).collect::<Vec<_>>().join(", ")
}

// Validation
/// Validate that `value` lies strictly between `min` and `max`.
pub fn validate_float_parameter(value: f64, min: f64, max: f64, parameter: &str) -> Result<(), CalibrationError> {
    if value.is_nan() || value <= min || max <= value {
        let ex_msg = format!("real value within range ({}, {})", min, max);
        Err(CalibrationError::InvalidParameter(
            parameter.to_string(),
            ex_msg,
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Arithmetic mean. Returns NaN on an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by `n`, not `n - 1`).
pub fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let ss = values.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    (ss / values.len() as f64).sqrt()
}

/// Percentile of `v` with linear interpolation between the closest ranks.
///
/// * `v` - Values to find the percentile for. Must not be empty.
/// * `q` - Percentile on the 0 to 100 scale.
pub fn percentile(v: &[f64], q: f64) -> f64 {
    let mut sorted = v.to_vec();
    sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_dev_is_population() {
        let v = vec![1., -1., 2., -2., 0.5, -0.5];
        assert!((std_dev(&v) - 1.75_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_interpolates() {
        let v = vec![4., 1., 3., 2., 5.];
        assert_eq!(percentile(&v, 0.0), 1.0);
        assert_eq!(percentile(&v, 50.0), 3.0);
        assert_eq!(percentile(&v, 100.0), 5.0);
        assert!((percentile(&v, 90.0) - 4.6).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_single_value() {
        assert_eq!(percentile(&[2.5], 37.0), 2.5);
    }

    #[test]
    fn test_validate_float_parameter() {
        assert!(validate_float_parameter(95.0, 0.0, 100.0, "interval_percentile").is_ok());
        assert!(validate_float_parameter(100.0, 0.0, 100.0, "interval_percentile").is_err());
        assert!(validate_float_parameter(f64::NAN, 0.0, 100.0, "interval_percentile").is_err());
    }

    #[test]
    fn test_fmt_vec_output() {
        assert_eq!(fmt_vec_output(&[1.0, 0.123456]), "1.0000, 0.1235");
        assert_eq!(fmt_vec_output(&[]), "");
    }

    #[test]
    fn test_items_to_strings() {
        assert_eq!(items_to_strings(&["a", "b"]), "a, b");
    }
}
