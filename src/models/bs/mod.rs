//! Black-Scholes pricing core for European options.
//!
//! ```text
//! d1 = (ln(S/K) + (r + σ²/2)·T) / (σ·√T)
//! d2 = d1 − σ·√T
//! call = S·Φ(d1) − K·e^(−rT)·Φ(d2)
//! put  = K·e^(−rT)·Φ(−d2) − S·Φ(−d1)
//! ```
//!
//! Degenerate inputs have closed-form limits instead of a division by zero:
//! at `T = 0` both legs are worth their intrinsic value, and at `σ = 0` the
//! price is the intrinsic value along the deterministic forward path,
//! `max(0, S − K·e^(−rT))` for a call.

pub mod greeks;

use crate::error::Result;
use crate::models::normal::norm_cdf;
use crate::types::{OptionType, PricingParameters, PricingResult};

pub use greeks::{greeks, vega, Greeks};

/// Standardised moneyness terms `(d1, d2)`.
///
/// Returns `None` when `σ·√T` is zero, where the terms are undefined.
pub fn d1_d2(params: &PricingParameters) -> Option<(f64, f64)> {
    d_terms(
        params.spot_price,
        params.strike_price,
        params.time_to_maturity,
        params.volatility,
        params.risk_free_rate,
    )
}

/// Prices both the call and the put for `params`.
///
/// # Errors
///
/// [`PricingError::InvalidParameter`](crate::PricingError) when `S <= 0`,
/// `K <= 0`, `T < 0`, `σ < 0` or any input is non-finite.
///
/// # Example
///
/// ```rust
/// use bsm_lib::{price, PricingParameters};
///
/// let params = PricingParameters::new(100.0, 100.0, 1.0, 0.2, 0.05)?;
/// let result = price(&params)?;
/// assert!((result.call_price - 10.4506).abs() < 1e-4);
/// assert!((result.put_price - 5.5735).abs() < 1e-4);
/// # Ok::<(), bsm_lib::PricingError>(())
/// ```
pub fn price(params: &PricingParameters) -> Result<PricingResult> {
    params.validate()?;
    Ok(price_unchecked(params))
}

/// Prices a single leg.
pub fn price_option(params: &PricingParameters, option_type: OptionType) -> Result<f64> {
    Ok(price(params)?.price(option_type))
}

/// Pricing without validation, for hot loops whose inputs were validated once.
pub(crate) fn price_unchecked(params: &PricingParameters) -> PricingResult {
    let s = params.spot_price;
    let k = params.strike_price;
    let t = params.time_to_maturity;
    let r = params.risk_free_rate;

    if t == 0.0 {
        return PricingResult {
            call_price: (s - k).max(0.0),
            put_price: (k - s).max(0.0),
            d1: None,
            d2: None,
        };
    }

    let discounted_strike = k * (-r * t).exp();

    match d_terms(s, k, t, params.volatility, r) {
        Some((d1, d2)) => {
            // Round-off can push deep out-of-the-money legs a hair below zero.
            let call = (s * norm_cdf(d1) - discounted_strike * norm_cdf(d2)).max(0.0);
            let put = (discounted_strike * norm_cdf(-d2) - s * norm_cdf(-d1)).max(0.0);
            PricingResult {
                call_price: call,
                put_price: put,
                d1: Some(d1),
                d2: Some(d2),
            }
        }
        None => PricingResult {
            call_price: (s - discounted_strike).max(0.0),
            put_price: (discounted_strike - s).max(0.0),
            d1: None,
            d2: None,
        },
    }
}

pub(crate) fn d_terms(s: f64, k: f64, t: f64, sigma: f64, r: f64) -> Option<(f64, f64)> {
    let vol_sqrt_t = sigma * t.sqrt();
    if !(vol_sqrt_t > 0.0) || !vol_sqrt_t.is_finite() {
        return None;
    }
    let d1 = ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / vol_sqrt_t;
    Some((d1, d1 - vol_sqrt_t))
}
