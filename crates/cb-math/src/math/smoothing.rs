//! Additive-smoothing floor enforcement.

use thiserror::Error;

/// Smallest admissible smoothing value. Anything below this produces
/// log-domain blowups downstream.
pub const ALPHA_MIN: f64 = 1e-10;

/// Errors raised while validating a smoothing parameter.
#[derive(Debug, Error, PartialEq)]
pub enum AlphaError {
    #[error("Smoothing parameter alpha = {value:.1e}. alpha should be > 0.")]
    Negative { value: f64 },
}

/// Clamp smoothing components to the numeric floor.
///
/// Strictly negative components fail, naming the first offending value.
/// Components in `[0, ALPHA_MIN)` are raised to `ALPHA_MIN`; the second
/// tuple element reports whether any clamping occurred so the caller can
/// warn exactly once per call.
pub fn clamp_alpha(alpha: &[f64]) -> Result<(Vec<f64>, bool), AlphaError> {
    if let Some(bad) = alpha.iter().find(|a| **a < 0.0 || a.is_nan()) {
        return Err(AlphaError::Negative { value: *bad });
    }
    let mut clamped = false;
    let out = alpha
        .iter()
        .map(|a| {
            if *a < ALPHA_MIN {
                clamped = true;
                ALPHA_MIN
            } else {
                *a
            }
        })
        .collect();
    Ok((out, clamped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_when_above_floor() {
        let (out, clamped) = clamp_alpha(&[1.0, 0.5]).unwrap();
        assert_eq!(out, vec![1.0, 0.5]);
        assert!(!clamped);
    }

    #[test]
    fn zero_is_clamped_to_floor() {
        let (out, clamped) = clamp_alpha(&[0.0]).unwrap();
        assert_eq!(out, vec![ALPHA_MIN]);
        assert!(clamped);
    }

    #[test]
    fn tiny_positive_is_clamped() {
        let (out, clamped) = clamp_alpha(&[ALPHA_MIN / 2.0, 0.5]).unwrap();
        assert_eq!(out, vec![ALPHA_MIN, 0.5]);
        assert!(clamped);
    }

    #[test]
    fn negative_component_errors_with_value() {
        let err = clamp_alpha(&[1.0, -0.1]).unwrap_err();
        assert_eq!(err, AlphaError::Negative { value: -0.1 });
        let msg = err.to_string();
        assert!(msg.contains("-1.0e-1"), "message was: {msg}");
        assert!(msg.contains("alpha should be > 0."));
    }

    #[test]
    fn nan_component_errors() {
        assert!(clamp_alpha(&[f64::NAN]).is_err());
    }
}
