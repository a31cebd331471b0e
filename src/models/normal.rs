//! Standard normal distribution primitives.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Standard normal cumulative distribution function Φ(x).
///
/// Written in terms of `erfc` so the lower tail keeps full relative precision.
/// Saturates to exactly 0 or 1 at ±∞.
pub fn norm_cdf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    0.5 * libm::erfc(-x * FRAC_1_SQRT_2)
}

/// Standard normal probability density function φ(x).
pub fn norm_pdf(x: f64) -> f64 {
    if x.is_infinite() {
        return 0.0;
    }
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdf_reference_values() {
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-15);
        assert!((norm_cdf(1.0) - 0.841_344_746_068_542_9).abs() < 1e-14);
        assert!((norm_cdf(-1.96) - 0.024_997_895_148_220_4).abs() < 1e-14);
        assert_eq!(norm_cdf(f64::INFINITY), 1.0);
        assert_eq!(norm_cdf(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_cdf_symmetry() {
        for &x in &[0.1, 0.5, 1.3, 2.7, 5.0] {
            assert!((norm_cdf(x) + norm_cdf(-x) - 1.0).abs() < 1e-15);
        }
    }

    #[test]
    fn test_pdf() {
        assert!((norm_pdf(0.0) - 0.398_942_280_401_432_7).abs() < 1e-15);
        assert!((norm_pdf(1.5) - norm_pdf(-1.5)).abs() < 1e-18);
        assert_eq!(norm_pdf(f64::INFINITY), 0.0);
    }
}
