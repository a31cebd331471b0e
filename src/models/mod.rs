pub mod bs;
pub mod normal;
pub mod smile;

/// Common traits used by the surface builders
pub mod traits {
    use crate::error::Result;

    /// A deterministic volatility as a function of strike and maturity.
    ///
    /// Implementations feed the theoretical surface builder, which prices each
    /// node with the returned volatility.
    pub trait VolatilityFunction: Send + Sync + std::fmt::Debug {
        /// Volatility for a node at `strike` and `maturity` (years) given the
        /// current `spot`.
        fn volatility(&self, strike: f64, maturity: f64, spot: f64) -> f64;

        /// Checks the function's own parameters.
        fn validate(&self) -> Result<()> {
            Ok(())
        }
    }
}

/// Utility functions shared by the pricing and surface code
pub mod utils {
    /// Calculate log-moneyness: ln(K/S)
    pub fn log_moneyness(strike: f64, spot: f64) -> f64 {
        (strike / spot).ln()
    }

    /// Checks that a slice is strictly increasing.
    pub fn is_strictly_increasing(values: &[f64]) -> bool {
        values.windows(2).all(|w| w[0] < w[1])
    }
}
