//! Error taxonomy for the pricing engine.
//!
//! Two kinds of failure are distinguished:
//!
//! - [`PricingError::InvalidParameter`]: malformed or out-of-domain input. Raised
//!   immediately and never retried.
//! - [`PricingError::NotConverged`]: the implied volatility search could not
//!   produce a volatility. Batch operations (surface building) treat this as a
//!   value and keep going.
//!
//! Degenerate-but-valid inputs (`T = 0`, `σ = 0`) are not errors; they have a
//! defined limiting price.

use std::fmt;

use thiserror::Error;

/// Errors raised by the pricing engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PricingError {
    /// An input is malformed or outside its domain.
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
        /// Human-readable constraint that was violated.
        reason: String,
    },

    /// Implied volatility could not be recovered.
    #[error("implied volatility not converged: {0}")]
    NotConverged(NonConvergence),
}

impl PricingError {
    /// Shorthand for building an [`PricingError::InvalidParameter`].
    pub fn invalid(name: &'static str, value: f64, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            value,
            reason: reason.into(),
        }
    }

    pub fn is_not_converged(&self) -> bool {
        matches!(self, Self::NotConverged(_))
    }

    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }
}

/// Why the implied volatility search gave up.
#[derive(Debug, Clone, PartialEq)]
pub enum NonConvergence {
    /// The option has expired; every volatility yields the same price.
    Expired,
    /// The observed price is below the zero-volatility (intrinsic) price.
    BelowIntrinsic { price: f64, bound: f64 },
    /// The observed price is at or above the trivial no-arbitrage upper bound.
    AboveUpperBound { price: f64, bound: f64 },
    /// The observed price is not reachable inside the volatility bracket.
    OutsideBracket { price: f64, low: f64, high: f64 },
    /// The iteration budget ran out before the tolerance was met.
    IterationsExhausted { iterations: usize, residual: f64 },
    /// The Brent root finder reported a failure.
    RootFinder(String),
}

impl fmt::Display for NonConvergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired => write!(f, "option has expired, volatility is not identifiable"),
            Self::BelowIntrinsic { price, bound } => {
                write!(f, "price {price:.6} is below intrinsic value {bound:.6}")
            }
            Self::AboveUpperBound { price, bound } => {
                write!(f, "price {price:.6} is at or above upper bound {bound:.6}")
            }
            Self::OutsideBracket { price, low, high } => write!(
                f,
                "price {price:.6} not attainable for volatility in [{low}, {high}]"
            ),
            Self::IterationsExhausted {
                iterations,
                residual,
            } => write!(
                f,
                "gave up after {iterations} iterations (residual {residual:.3e})"
            ),
            Self::RootFinder(msg) => write!(f, "root finder failed: {msg}"),
        }
    }
}

/// Shorthand `Result` used throughout the engine.
pub type Result<T, E = PricingError> = std::result::Result<T, E>;

/// Returns `Err(PricingError::InvalidParameter)` if the condition is false.
///
/// ```
/// use bsm_lib::{ensure_param, error::Result};
/// fn positive(x: f64) -> Result<f64> {
///     ensure_param!(x > 0.0, "x", x, "must be > 0");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure_param {
    ($cond:expr, $name:expr, $value:expr, $($reason:tt)*) => {
        if !$cond {
            return Err($crate::error::PricingError::invalid(
                $name,
                $value as f64,
                format!($($reason)*),
            ));
        }
    };
}
