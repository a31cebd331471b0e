//! "True" volatility functions used to generate theoretical surfaces.
//!
//! A theoretical surface is produced by pricing every (strike, maturity) node
//! with the volatility returned by one of these functions and, optionally,
//! recovering it again through the implied volatility solver.

use serde::{Deserialize, Serialize};

use crate::ensure_param;
use crate::error::Result;
use crate::models::traits::VolatilityFunction;
use crate::models::utils::log_moneyness;

/// Flat volatility, identical at every node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantVolatility(pub f64);

impl VolatilityFunction for ConstantVolatility {
    fn volatility(&self, _strike: f64, _maturity: f64, _spot: f64) -> f64 {
        self.0
    }

    fn validate(&self) -> Result<()> {
        ensure_param!(
            self.0.is_finite() && self.0 > 0.0,
            "volatility",
            self.0,
            "must be > 0 and finite"
        );
        Ok(())
    }
}

/// Quadratic smile in moneyness on top of a square-root term structure:
///
/// ```text
/// σ(K, T) = base · (1 + term · √T) + smile · (K/S − 1)²
/// ```
///
/// The minimum sits at the money; both wings rise symmetrically.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmileVolatility {
    /// ATM volatility level at `T = 0`
    pub base_volatility: f64,
    /// Curvature of the smile in moneyness
    pub smile_factor: f64,
    /// Slope of the term structure in √T
    pub term_structure_factor: f64,
}

impl Default for SmileVolatility {
    fn default() -> Self {
        Self {
            base_volatility: 0.2,
            smile_factor: 0.4,
            term_structure_factor: 0.1,
        }
    }
}

impl VolatilityFunction for SmileVolatility {
    fn volatility(&self, strike: f64, maturity: f64, spot: f64) -> f64 {
        let moneyness = strike / spot;
        let term = self.base_volatility * (1.0 + self.term_structure_factor * maturity.sqrt());
        term + self.smile_factor * (moneyness - 1.0).powi(2)
    }

    fn validate(&self) -> Result<()> {
        ensure_param!(
            self.base_volatility.is_finite() && self.base_volatility > 0.0,
            "base_volatility",
            self.base_volatility,
            "must be > 0 and finite"
        );
        ensure_param!(
            self.smile_factor.is_finite() && self.smile_factor >= 0.0,
            "smile_factor",
            self.smile_factor,
            "must be >= 0 and finite"
        );
        ensure_param!(
            self.term_structure_factor.is_finite() && self.term_structure_factor >= 0.0,
            "term_structure_factor",
            self.term_structure_factor,
            "must be >= 0 and finite"
        );
        Ok(())
    }
}

/// Raw SVI parameters for a single slice.
///
/// Total variance in log-moneyness `k = ln(K/S)`:
///
/// ```text
/// w(k) = a + b · (ρ(k − m) + √((k − m)² + σ²))
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SviParams {
    /// Slice maturity in years (t > 0)
    pub t: f64,
    /// Vertical shift of total variance
    pub a: f64,
    /// Wing slope (b > 0)
    pub b: f64,
    /// Skew (-1 < ρ < 1)
    pub rho: f64,
    /// Horizontal shift
    pub m: f64,
    /// ATM curvature (σ > 0)
    pub sigma: f64,
}

impl SviParams {
    pub fn new(t: f64, a: f64, b: f64, rho: f64, m: f64, sigma: f64) -> Result<Self> {
        let params = Self {
            t,
            a,
            b,
            rho,
            m,
            sigma,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_param!(self.t.is_finite() && self.t > 0.0, "t", self.t, "must be > 0");
        ensure_param!(self.a.is_finite(), "a", self.a, "must be finite");
        ensure_param!(self.b.is_finite() && self.b > 0.0, "b", self.b, "must be > 0");
        ensure_param!(
            self.rho.is_finite() && self.rho > -1.0 && self.rho < 1.0,
            "rho",
            self.rho,
            "must lie in (-1, 1)"
        );
        ensure_param!(self.m.is_finite(), "m", self.m, "must be finite");
        ensure_param!(
            self.sigma.is_finite() && self.sigma > 0.0,
            "sigma",
            self.sigma,
            "must be > 0"
        );

        // Minimum of w(k) over k; negative means negative variance in the wings.
        let min_variance = self.a + self.b * self.sigma * (1.0 - self.rho * self.rho).sqrt();
        ensure_param!(
            min_variance >= 0.0,
            "a",
            self.a,
            "a + b·σ·√(1 − ρ²) = {min_variance} must be >= 0"
        );
        Ok(())
    }
}

/// One SVI slice applied at every maturity (sticky moneyness): the slice's
/// implied volatility at `ln(K/S)` is used regardless of the node's maturity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SviSmile {
    pub params: SviParams,
}

impl SviSmile {
    pub fn new(params: SviParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn total_variance_at_k(&self, k: f64) -> f64 {
        let p = &self.params;
        let shifted = k - p.m;
        p.a + p.b * (p.rho * shifted + (shifted * shifted + p.sigma * p.sigma).sqrt())
    }
}

impl VolatilityFunction for SviSmile {
    fn volatility(&self, strike: f64, _maturity: f64, spot: f64) -> f64 {
        let w = self.total_variance_at_k(log_moneyness(strike, spot));
        (w.max(0.0) / self.params.t).sqrt()
    }

    fn validate(&self) -> Result<()> {
        self.params.validate()
    }
}
