//! Implied volatility: the σ at which the Black-Scholes price matches an
//! observed option price.
//!
//! The search runs on the bracket `[min_volatility, max_volatility]` of a
//! [`SolverConfig`] (default `[1e-6, 5.0]`) and never exceeds
//! `max_iterations` steps (default 100). Before searching, the observed price
//! is checked against the no-arbitrage bounds:
//!
//! - below the zero-volatility price `max(0, S − K·e^(−rT))` (call) or
//!   `max(0, K·e^(−rT) − S)` (put): no solution;
//! - at or above `S` (call) or `K·e^(−rT)` (put): no solution.
//!
//! Both cases, expired options, prices unreachable inside the bracket and an
//! exhausted iteration budget are reported as
//! [`PricingError::NotConverged`]. The search is deterministic: identical
//! inputs give identical output.
//!
//! In-the-money prices are mapped through put-call parity and solved on the
//! out-of-the-money leg. `tolerance` bounds the price residual of that leg:
//! absolutely for prices of one unit or more, relative to the price below
//! that. The search also stops once σ is resolved to f64 precision.

pub mod solver;

use log::debug;

pub use solver::SolverOutcome;

use crate::config::{SolverConfig, SolverMethod};
use crate::ensure_param;
use crate::error::{NonConvergence, PricingError, Result};
use crate::types::{MarketParameters, OptionType};
use solver::Objective;

/// Recovers the volatility implied by `observed_price` using the default
/// hybrid solver with the given tolerance and iteration cap.
///
/// # Example
///
/// ```rust
/// use bsm_lib::{implied_volatility, price_option, MarketParameters, OptionType};
///
/// let market = MarketParameters::new(100.0, 100.0, 1.0, 0.05)?;
/// let observed = price_option(&market.with_volatility(0.2), OptionType::Call)?;
/// let sigma = implied_volatility(observed, &market, OptionType::Call, 1e-8, 100)?;
/// assert!((sigma - 0.2).abs() < 1e-6);
/// # Ok::<(), bsm_lib::PricingError>(())
/// ```
pub fn implied_volatility(
    observed_price: f64,
    params: &MarketParameters,
    option_type: OptionType,
    tolerance: f64,
    max_iterations: usize,
) -> Result<f64> {
    let config = SolverConfig {
        tolerance,
        max_iterations,
        ..SolverConfig::default()
    };
    implied_volatility_with(observed_price, params, option_type, &config)
}

/// Recovers the implied volatility with an explicit solver configuration.
pub fn implied_volatility_with(
    observed_price: f64,
    params: &MarketParameters,
    option_type: OptionType,
    config: &SolverConfig,
) -> Result<f64> {
    solve(observed_price, params, option_type, config).map(|outcome| outcome.volatility)
}

/// Like [`implied_volatility_with`] but also returns iteration count and
/// final residual.
pub fn solve(
    observed_price: f64,
    params: &MarketParameters,
    option_type: OptionType,
    config: &SolverConfig,
) -> Result<SolverOutcome> {
    config.validate()?;
    params.validate()?;
    ensure_param!(
        observed_price.is_finite() && observed_price >= 0.0,
        "observed_price",
        observed_price,
        "must be >= 0 and finite"
    );

    if params.time_to_maturity == 0.0 {
        return Err(PricingError::NotConverged(NonConvergence::Expired));
    }

    let lower = params.lower_bound(option_type);
    if observed_price < lower - config.tolerance {
        return Err(PricingError::NotConverged(NonConvergence::BelowIntrinsic {
            price: observed_price,
            bound: lower,
        }));
    }
    let upper = params.upper_bound(option_type);
    if observed_price >= upper {
        return Err(PricingError::NotConverged(
            NonConvergence::AboveUpperBound {
                price: observed_price,
                bound: upper,
            },
        ));
    }

    // Invert the out-of-the-money leg; put-call parity gives it the same σ.
    let leg = params.out_of_the_money();
    let target = if leg == option_type {
        observed_price
    } else {
        (observed_price - lower).max(0.0)
    };
    let (low, high) = (config.min_volatility, config.max_volatility);
    if target <= 0.0 {
        return Err(PricingError::NotConverged(NonConvergence::OutsideBracket {
            price: observed_price,
            low,
            high,
        }));
    }

    let objective = Objective {
        market: params,
        option_type: leg,
        target,
    };
    // Absolute for prices of at least one unit, relative below.
    let tolerance = config.tolerance * target.min(1.0);

    let f_low = objective.value(low);
    let f_high = objective.value(high);
    if f_low == 0.0 || f_high == 0.0 {
        let volatility = if f_low == 0.0 { low } else { high };
        return Ok(SolverOutcome {
            volatility,
            iterations: 0,
            residual: 0.0,
        });
    }
    if f_low > 0.0 || f_high < 0.0 {
        return Err(PricingError::NotConverged(NonConvergence::OutsideBracket {
            price: observed_price,
            low,
            high,
        }));
    }

    let outcome = match config.method {
        SolverMethod::Hybrid => solver::hybrid(&objective, low, high, tolerance, config.max_iterations),
        SolverMethod::Bisection => {
            solver::bisection(&objective, low, high, tolerance, config.max_iterations)
        }
        SolverMethod::Brent => solver::brent(&objective, low, high, tolerance, config.max_iterations),
    }?;

    debug!(
        "implied vol {:.8} for {} K={} T={} after {} iterations ({:?})",
        outcome.volatility,
        option_type,
        params.strike_price,
        params.time_to_maturity,
        outcome.iterations,
        config.method
    );
    Ok(outcome)
}
