//! Root finders for `price(σ) = observed_price` on a fixed volatility bracket.
//!
//! All three methods share the same preconditions, checked by the caller:
//! the bracket `[low, high]` straddles the root, i.e. `f(low) < 0 < f(high)`
//! for `f(σ) = price(σ) − observed_price`. Since the Black-Scholes price is
//! strictly increasing in σ whenever `T > 0`, the bracket only ever shrinks
//! around the unique root.

use log::trace;
use roots::{find_root_brent, Convergency};
use std::f64::consts::PI;

use crate::error::{NonConvergence, PricingError, Result};
use crate::models::bs::greeks::vega_unchecked;
use crate::models::bs::price_unchecked;
use crate::types::{MarketParameters, OptionType};

/// Bracket width (relative) below which the volatility is as resolved as f64 allows.
const VOL_RESOLUTION: f64 = 4.0 * f64::EPSILON;

/// Price residual as a function of volatility.
pub(crate) struct Objective<'a> {
    pub market: &'a MarketParameters,
    pub option_type: OptionType,
    pub target: f64,
}

impl Objective<'_> {
    pub fn value(&self, sigma: f64) -> f64 {
        price_unchecked(&self.market.with_volatility(sigma)).price(self.option_type) - self.target
    }

    pub fn vega(&self, sigma: f64) -> f64 {
        vega_unchecked(&self.market.with_volatility(sigma))
    }

    /// Brenner-Subrahmanyam ATM approximation `σ ≈ √(2π/T) · C/S`, with puts
    /// mapped to the equivalent call through put-call parity.
    pub fn initial_guess(&self) -> f64 {
        let m = self.market;
        let call_equivalent = match self.option_type {
            OptionType::Call => self.target,
            OptionType::Put => {
                self.target + m.spot_price - m.strike_price * m.discount_factor()
            }
        };
        (2.0 * PI / m.time_to_maturity).sqrt() * call_equivalent / m.spot_price
    }
}

/// Successful solve together with diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOutcome {
    pub volatility: f64,
    /// Objective evaluations (Brent) or iterations (Newton/bisection)
    pub iterations: usize,
    /// `|price(volatility) − observed_price|`
    pub residual: f64,
}

fn exhausted(iterations: usize, residual: f64) -> PricingError {
    PricingError::NotConverged(NonConvergence::IterationsExhausted {
        iterations,
        residual,
    })
}

fn collapsed(low: f64, high: f64) -> bool {
    high - low <= VOL_RESOLUTION * high
}

/// Brent stopping rule: price residual within tolerance, or the σ bracket
/// resolved to f64 precision.
struct PriceConvergency {
    tolerance: f64,
    max_iterations: usize,
}

impl Convergency<f64> for PriceConvergency {
    fn is_root_found(&mut self, y: f64) -> bool {
        y.abs() <= self.tolerance
    }

    fn is_converged(&mut self, x1: f64, x2: f64) -> bool {
        (x1 - x2).abs() <= VOL_RESOLUTION * x1.abs().max(x2.abs())
    }

    fn is_iteration_limit_reached(&mut self, iter: usize) -> bool {
        iter >= self.max_iterations
    }
}

/// Newton-Raphson on vega; any step that is non-finite or would leave the
/// current bracket is replaced by a bisection step.
pub(crate) fn hybrid(
    objective: &Objective<'_>,
    mut low: f64,
    mut high: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Result<SolverOutcome> {
    let mut sigma = objective.initial_guess();
    if !(sigma > low && sigma < high) {
        sigma = 0.5 * (low + high);
    }

    for iteration in 1..=max_iterations {
        let residual = objective.value(sigma);
        if residual.abs() <= tolerance || collapsed(low, high) {
            return Ok(SolverOutcome {
                volatility: sigma,
                iterations: iteration,
                residual: residual.abs(),
            });
        }

        if residual > 0.0 {
            high = sigma;
        } else {
            low = sigma;
        }

        let newton = sigma - residual / objective.vega(sigma);
        if (newton - sigma).abs() <= VOL_RESOLUTION * sigma {
            // Newton can no longer move σ
            return Ok(SolverOutcome {
                volatility: sigma,
                iterations: iteration,
                residual: residual.abs(),
            });
        }
        sigma = if newton.is_finite() && newton > low && newton < high {
            newton
        } else {
            trace!("newton step {newton} left [{low}, {high}], bisecting");
            0.5 * (low + high)
        };
    }

    Err(exhausted(max_iterations, objective.value(sigma).abs()))
}

pub(crate) fn bisection(
    objective: &Objective<'_>,
    mut low: f64,
    mut high: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Result<SolverOutcome> {
    let mut sigma = 0.5 * (low + high);

    for iteration in 1..=max_iterations {
        let residual = objective.value(sigma);
        if residual.abs() <= tolerance || collapsed(low, high) {
            return Ok(SolverOutcome {
                volatility: sigma,
                iterations: iteration,
                residual: residual.abs(),
            });
        }

        if residual > 0.0 {
            high = sigma;
        } else {
            low = sigma;
        }
        sigma = 0.5 * (low + high);
    }

    Err(exhausted(max_iterations, objective.value(sigma).abs()))
}

/// Brent's method on the price residual.
pub(crate) fn brent(
    objective: &Objective<'_>,
    low: f64,
    high: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Result<SolverOutcome> {
    let mut convergency = PriceConvergency {
        tolerance,
        max_iterations,
    };
    let mut evaluations = 0usize;

    let root = find_root_brent(
        low,
        high,
        |sigma: f64| {
            evaluations += 1;
            objective.value(sigma)
        },
        &mut convergency,
    );

    match root {
        Ok(volatility) => Ok(SolverOutcome {
            volatility,
            iterations: evaluations,
            residual: objective.value(volatility).abs(),
        }),
        Err(roots::SearchError::NoConvergency) => Err(exhausted(
            max_iterations,
            f64::NAN,
        )),
        Err(e) => Err(PricingError::NotConverged(NonConvergence::RootFinder(
            format!("{e:?}"),
        ))),
    }
}
