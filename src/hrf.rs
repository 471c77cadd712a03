//! Hemodynamic response function (HRF) kernels.
//!
//! The kernel is a difference of two unit-scale gamma densities, a peak and a delayed undershoot,
//! normalized so that its maximum equals the output scale.
//!
//! # Example
//!
//! ```rust
//! use approx::assert_relative_eq;
//! use rusty_bold::hrf::{hrf, kernel_times, HrfShape};
//!
//! // Sample the kernel once per TR of 2.0 over 32.0 time units
//! let times = kernel_times(32.0, 2.0);
//! let kernel = hrf(&times, &HrfShape::default()).unwrap();
//!
//! assert_eq!(kernel.len(), 16);
//! assert_relative_eq!(kernel.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 0.6);
//! ```
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::BoldError;
use crate::utils::arange;

/// Lanczos coefficients (g = 7, n = 9).
const LANCZOS_COEFFS: [f64; 9] = [
    0.99999999999980993,
    676.5203681218851,
    -1259.1392167224028,
    771.32342877765313,
    -176.61502916214059,
    12.507343278686905,
    -0.13857109526572012,
    9.9843695780195716e-6,
    1.5056327351493116e-7,
];

/// Shape parameters of the kernel.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HrfShape {
    /// Shape of the gamma density modelling the response peak.
    pub peak_shape: f64,
    /// Shape of the gamma density modelling the post-stimulus undershoot.
    pub undershoot_shape: f64,
    /// Relative weight of the undershoot.
    pub undershoot_weight: f64,
    /// Maximum value of the normalized kernel.
    pub scale: f64,
}

impl Default for HrfShape {
    fn default() -> Self {
        HrfShape {
            peak_shape: 6.0,
            undershoot_shape: 12.0,
            undershoot_weight: 0.35,
            scale: 0.6,
        }
    }
}

impl HrfShape {
    /// Check that the shape parameters are valid, i.e., finite and with positive gamma shapes.
    pub fn validate(&self) -> Result<(), BoldError> {
        if !(self.peak_shape > 0.0 && self.peak_shape.is_finite()) {
            return Err(BoldError::InvalidParameter(format!(
                "The peak shape must be positive and finite, got {}",
                self.peak_shape
            )));
        }
        if !(self.undershoot_shape > 0.0 && self.undershoot_shape.is_finite()) {
            return Err(BoldError::InvalidParameter(format!(
                "The undershoot shape must be positive and finite, got {}",
                self.undershoot_shape
            )));
        }
        if !self.undershoot_weight.is_finite() || !self.scale.is_finite() {
            return Err(BoldError::InvalidParameter(
                "The undershoot weight and the scale must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Unnormalized response at the given time offset.
    fn response(&self, t: f64) -> f64 {
        gamma_pdf(t, self.peak_shape) - self.undershoot_weight * gamma_pdf(t, self.undershoot_shape)
    }
}

/// Natural logarithm of the gamma function, for x > 0.
fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection formula
        (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x)
    } else {
        let z = x - 1.0;
        let ag = LANCZOS_COEFFS
            .iter()
            .enumerate()
            .skip(1)
            .fold(LANCZOS_COEFFS[0], |acc, (i, c)| acc + c / (z + i as f64));
        let t = z + 7.5;
        0.5 * (2.0 * PI).ln() + (z + 0.5) * t.ln() - t + ag.ln()
    }
}

/// Density of the unit-scale gamma distribution with the given shape, evaluated at t.
/// The density vanishes for negative t.
pub fn gamma_pdf(t: f64, shape: f64) -> f64 {
    if t < 0.0 {
        return 0.0;
    }
    if t == 0.0 {
        return match shape {
            s if s < 1.0 => f64::INFINITY,
            s if s == 1.0 => 1.0,
            _ => 0.0,
        };
    }
    ((shape - 1.0) * t.ln() - t - ln_gamma(shape)).exp()
}

/// Time offsets at which to sample the kernel: [0, tr, 2 tr, ...) up to the provided duration.
pub fn kernel_times(duration: f64, tr: f64) -> Vec<f64> {
    arange(0.0, duration, tr)
}

/// Returns the kernel sampled at the provided time offsets.
/// The offsets must be finite and non-negative, and must span the kernel support so that the unnormalized response has a positive maximum.
pub fn hrf(times: &[f64], shape: &HrfShape) -> Result<Vec<f64>, BoldError> {
    shape.validate()?;

    if times.is_empty() {
        return Err(BoldError::InvalidParameter(
            "The kernel requires at least one time offset".to_string(),
        ));
    }
    if let Some(t) = times.iter().find(|t| !(t.is_finite() && **t >= 0.0)) {
        return Err(BoldError::InvalidParameter(format!(
            "Time offsets must be finite and non-negative, got {}",
            t
        )));
    }

    let values: Vec<f64> = times.iter().map(|t| shape.response(*t)).collect();
    if let Some((t, v)) = times.iter().zip(values.iter()).find(|(_, v)| !v.is_finite()) {
        return Err(BoldError::InvalidKernelSupport(format!(
            "The unnormalized kernel is {} at offset {}",
            v, t
        )));
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !(max > 0.0 && max.is_finite()) {
        return Err(BoldError::InvalidKernelSupport(format!(
            "The unnormalized kernel maximum is {} over offsets [{}, {}]",
            max,
            times[0],
            times[times.len() - 1]
        )));
    }

    Ok(values.into_iter().map(|v| v / max * shape.scale).collect())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn argmax(values: &[f64]) -> usize {
        values
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |(i, m), (j, v)| if *v > m { (j, *v) } else { (i, m) })
            .0
    }

    fn argmin(values: &[f64]) -> usize {
        values
            .iter()
            .enumerate()
            .fold((0, f64::INFINITY), |(i, m), (j, v)| if *v < m { (j, *v) } else { (i, m) })
            .0
    }

    #[test]
    fn test_ln_gamma() {
        assert_relative_eq!(ln_gamma(1.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(ln_gamma(2.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(ln_gamma(6.0), 120_f64.ln(), epsilon = 1e-10);
        assert_relative_eq!(ln_gamma(12.0), 39916800_f64.ln(), epsilon = 1e-10);
        assert_relative_eq!(ln_gamma(0.5), PI.sqrt().ln(), epsilon = 1e-10);
    }

    #[test]
    fn test_gamma_pdf() {
        assert_eq!(gamma_pdf(-1.0, 6.0), 0.0);
        assert_eq!(gamma_pdf(0.0, 6.0), 0.0);
        assert_eq!(gamma_pdf(0.0, 1.0), 1.0);
        assert_relative_eq!(gamma_pdf(1.0, 1.0), (-1_f64).exp(), epsilon = 1e-12);
        // t^5 e^-t / 5! at t = 5
        assert_relative_eq!(
            gamma_pdf(5.0, 6.0),
            3125.0 * (-5_f64).exp() / 120.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_hrf_scale() {
        let times = arange(0.0, 30.0, 1.0);
        let kernel = hrf(&times, &HrfShape::default()).unwrap();
        assert_eq!(kernel.len(), times.len());

        let max_abs = kernel.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        assert_relative_eq!(max_abs, 0.6, epsilon = 1e-12);

        let kernel = hrf(&arange(0.0, 32.0, 0.1), &HrfShape::default()).unwrap();
        let max_abs = kernel.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        assert_relative_eq!(max_abs, 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_hrf_shape() {
        let times = arange(0.0, 30.0, 1.0);
        let kernel = hrf(&times, &HrfShape::default()).unwrap();

        assert_eq!(kernel[0], 0.0);
        assert_eq!(argmax(&kernel), 5);
        let trough = argmin(&kernel);
        assert!(trough >= 11 && trough <= 16);
        assert!(kernel[trough] < 0.0);
    }

    #[test]
    fn test_hrf_deterministic() {
        let times = arange(0.0, 360.0, 2.0);
        let kernel_1 = hrf(&times, &HrfShape::default()).unwrap();
        let kernel_2 = hrf(&times, &HrfShape::default()).unwrap();
        assert!(kernel_1
            .iter()
            .zip(kernel_2.iter())
            .all(|(a, b)| a.to_bits() == b.to_bits()));
    }

    #[test]
    fn test_hrf_custom_shape() {
        let shape = HrfShape {
            scale: 1.0,
            undershoot_weight: 0.0,
            ..HrfShape::default()
        };
        let kernel = hrf(&arange(0.0, 30.0, 1.0), &shape).unwrap();
        assert_relative_eq!(kernel[5], 1.0, epsilon = 1e-12);
        assert!(kernel.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_hrf_invalid() {
        let shape = HrfShape::default();

        assert!(matches!(hrf(&[], &shape), Err(BoldError::InvalidParameter(_))));
        assert!(matches!(
            hrf(&[0.0, -1.0], &shape),
            Err(BoldError::InvalidParameter(_))
        ));
        assert!(matches!(
            hrf(&[0.0, f64::NAN], &shape),
            Err(BoldError::InvalidParameter(_))
        ));
        assert!(matches!(
            hrf(&[0.0], &shape),
            Err(BoldError::InvalidKernelSupport(_))
        ));
        assert!(matches!(
            hrf(&[0.0, 0.0, 0.0], &shape),
            Err(BoldError::InvalidKernelSupport(_))
        ));

        let shape = HrfShape {
            peak_shape: 0.0,
            ..HrfShape::default()
        };
        assert!(matches!(
            hrf(&[0.0, 1.0], &shape),
            Err(BoldError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_hrf_unbounded_density_at_zero() {
        let times = arange(0.0, 30.0, 1.0);

        // Shapes below one make the gamma density unbounded at zero
        let shape = HrfShape {
            peak_shape: 0.5,
            undershoot_shape: 0.5,
            ..HrfShape::default()
        };
        assert!(matches!(
            hrf(&times, &shape),
            Err(BoldError::InvalidKernelSupport(_))
        ));

        let shape = HrfShape {
            peak_shape: 1.0,
            undershoot_shape: 0.5,
            ..HrfShape::default()
        };
        assert!(matches!(
            hrf(&times, &shape),
            Err(BoldError::InvalidKernelSupport(_))
        ));

        let shape = HrfShape {
            undershoot_weight: 0.0,
            undershoot_shape: 0.5,
            ..HrfShape::default()
        };
        assert!(matches!(
            hrf(&times, &shape),
            Err(BoldError::InvalidKernelSupport(_))
        ));

        // Away from zero the same shapes yield a finite kernel
        let kernel = hrf(&arange(1.0, 30.0, 1.0), &shape).unwrap();
        assert!(kernel.iter().all(|v| v.is_finite()));
    }
}
