//! Payoff and profit/loss of a long option held to expiration.

use crate::ensure_param;
use crate::error::Result;
use crate::types::{OptionType, PnLPoint};

/// Profit or loss for the buyer of one option at expiration.
///
/// `payoff = max(0, S_T − K)` for a call and `max(0, K − S_T)` for a put;
/// `profit_loss = payoff − premium_paid`.
///
/// # Example
///
/// ```rust
/// use bsm_lib::{profit_loss, OptionType};
///
/// let point = profit_loss(OptionType::Call, 120.0, 100.0, 5.0)?;
/// assert_eq!(point.profit_loss, 15.0);
/// # Ok::<(), bsm_lib::PricingError>(())
/// ```
pub fn profit_loss(
    option_type: OptionType,
    spot_at_expiration: f64,
    strike: f64,
    premium_paid: f64,
) -> Result<PnLPoint> {
    ensure_param!(
        spot_at_expiration.is_finite() && spot_at_expiration >= 0.0,
        "spot_at_expiration",
        spot_at_expiration,
        "must be >= 0 and finite"
    );
    ensure_param!(
        strike.is_finite() && strike > 0.0,
        "strike",
        strike,
        "must be > 0 and finite"
    );
    ensure_param!(
        premium_paid.is_finite() && premium_paid >= 0.0,
        "premium_paid",
        premium_paid,
        "must be >= 0 and finite"
    );

    let payoff = option_type.intrinsic(spot_at_expiration, strike);
    Ok(PnLPoint {
        spot_at_expiration,
        premium_paid,
        payoff,
        profit_loss: payoff - premium_paid,
    })
}

/// Spot at expiration where the buyer exactly recovers the premium.
pub fn breakeven(option_type: OptionType, strike: f64, premium_paid: f64) -> f64 {
    match option_type {
        OptionType::Call => strike + premium_paid,
        OptionType::Put => (strike - premium_paid).max(0.0),
    }
}
