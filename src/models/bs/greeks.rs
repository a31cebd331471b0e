//! First- and second-order sensitivities of the Black-Scholes price.

use serde::{Deserialize, Serialize};

use super::d_terms;
use crate::error::Result;
use crate::models::normal::{norm_cdf, norm_pdf};
use crate::types::{OptionType, PricingParameters};

/// Price sensitivities of a single option.
///
/// Theta is per year of calendar time; vega and rho are per unit (not per
/// percentage point) of volatility and rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub vega: f64,
    pub theta: f64,
    pub rho: f64,
}

/// Computes the Greeks for one leg.
///
/// With `T = 0` or `σ = 0` the price is piecewise linear in spot, so gamma and
/// vega vanish and delta is a step at the (discounted) strike.
pub fn greeks(params: &PricingParameters, option_type: OptionType) -> Result<Greeks> {
    params.validate()?;
    Ok(greeks_unchecked(params, option_type))
}

/// ∂price/∂σ, identical for calls and puts.
pub fn vega(params: &PricingParameters) -> Result<f64> {
    params.validate()?;
    Ok(vega_unchecked(params))
}

pub(crate) fn vega_unchecked(params: &PricingParameters) -> f64 {
    let t = params.time_to_maturity;
    match d_terms(
        params.spot_price,
        params.strike_price,
        t,
        params.volatility,
        params.risk_free_rate,
    ) {
        Some((d1, _)) => params.spot_price * norm_pdf(d1) * t.sqrt(),
        None => 0.0,
    }
}

pub(crate) fn greeks_unchecked(params: &PricingParameters, option_type: OptionType) -> Greeks {
    let s = params.spot_price;
    let k = params.strike_price;
    let t = params.time_to_maturity;
    let r = params.risk_free_rate;
    let sigma = params.volatility;
    let df = (-r * t).exp();
    let sign = match option_type {
        OptionType::Call => 1.0,
        OptionType::Put => -1.0,
    };

    let Some((d1, d2)) = d_terms(s, k, t, sigma, r) else {
        // Deterministic limit: the option is a forward when in the money, else worthless.
        let in_the_money = sign * (s - k * df) > 0.0;
        if !in_the_money {
            return Greeks {
                delta: 0.0,
                gamma: 0.0,
                vega: 0.0,
                theta: 0.0,
                rho: 0.0,
            };
        }
        return Greeks {
            delta: sign,
            gamma: 0.0,
            vega: 0.0,
            theta: -sign * r * k * df,
            rho: sign * k * t * df,
        };
    };

    let sqrt_t = t.sqrt();
    let pdf_d1 = norm_pdf(d1);
    let vega = s * pdf_d1 * sqrt_t;
    let gamma = pdf_d1 / (s * sigma * sqrt_t);
    let decay = -s * pdf_d1 * sigma / (2.0 * sqrt_t);

    match option_type {
        OptionType::Call => Greeks {
            delta: norm_cdf(d1),
            gamma,
            vega,
            theta: decay - r * k * df * norm_cdf(d2),
            rho: k * t * df * norm_cdf(d2),
        },
        OptionType::Put => Greeks {
            delta: norm_cdf(d1) - 1.0,
            gamma,
            vega,
            theta: decay + r * k * df * norm_cdf(-d2),
            rho: -k * t * df * norm_cdf(-d2),
        },
    }
}
