use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ensure_param;
use crate::error::{PricingError, Result};

/// European option side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Call => "call",
            OptionType::Put => "put",
        }
    }

    /// The other side of a put-call pair.
    pub fn opposite(&self) -> Self {
        match self {
            OptionType::Call => OptionType::Put,
            OptionType::Put => OptionType::Call,
        }
    }

    /// Payoff of one option exercised with the underlying at `spot`.
    pub fn intrinsic(&self, spot: f64, strike: f64) -> f64 {
        match self {
            OptionType::Call => (spot - strike).max(0.0),
            OptionType::Put => (strike - spot).max(0.0),
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionType {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "call" | "c" => Ok(OptionType::Call),
            "put" | "p" => Ok(OptionType::Put),
            _ => Err(PricingError::invalid(
                "option_type",
                f64::NAN,
                format!("expected 'call' or 'put', got '{s}'"),
            )),
        }
    }
}

/// Inputs to the Black-Scholes model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingParameters {
    /// Current price of the underlying (S > 0)
    pub spot_price: f64,
    /// Strike price (K > 0)
    pub strike_price: f64,
    /// Time to maturity in years (T >= 0)
    pub time_to_maturity: f64,
    /// Annualised volatility as a decimal (σ >= 0)
    pub volatility: f64,
    /// Continuously compounded risk-free rate (any finite value)
    pub risk_free_rate: f64,
}

impl PricingParameters {
    /// Creates validated pricing parameters.
    pub fn new(
        spot_price: f64,
        strike_price: f64,
        time_to_maturity: f64,
        volatility: f64,
        risk_free_rate: f64,
    ) -> Result<Self> {
        let params = Self {
            spot_price,
            strike_price,
            time_to_maturity,
            volatility,
            risk_free_rate,
        };
        params.validate()?;
        Ok(params)
    }

    /// Checks every field against its domain.
    pub fn validate(&self) -> Result<()> {
        self.market().validate()?;
        ensure_param!(
            self.volatility.is_finite() && self.volatility >= 0.0,
            "volatility",
            self.volatility,
            "must be >= 0 and finite"
        );
        Ok(())
    }

    /// The volatility-free part of the parameters.
    pub fn market(&self) -> MarketParameters {
        MarketParameters {
            spot_price: self.spot_price,
            strike_price: self.strike_price,
            time_to_maturity: self.time_to_maturity,
            risk_free_rate: self.risk_free_rate,
        }
    }

    pub fn with_volatility(self, volatility: f64) -> Self {
        Self { volatility, ..self }
    }

    pub fn with_spot(self, spot_price: f64) -> Self {
        Self { spot_price, ..self }
    }

    pub fn with_strike(self, strike_price: f64) -> Self {
        Self {
            strike_price,
            ..self
        }
    }

    pub fn with_maturity(self, time_to_maturity: f64) -> Self {
        Self {
            time_to_maturity,
            ..self
        }
    }

    pub fn with_rate(self, risk_free_rate: f64) -> Self {
        Self {
            risk_free_rate,
            ..self
        }
    }

    /// Discount factor `e^(-rT)`.
    pub fn discount_factor(&self) -> f64 {
        (-self.risk_free_rate * self.time_to_maturity).exp()
    }
}

/// Pricing parameters without a volatility, as consumed by the implied
/// volatility solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketParameters {
    pub spot_price: f64,
    pub strike_price: f64,
    pub time_to_maturity: f64,
    pub risk_free_rate: f64,
}

impl MarketParameters {
    pub fn new(
        spot_price: f64,
        strike_price: f64,
        time_to_maturity: f64,
        risk_free_rate: f64,
    ) -> Result<Self> {
        let params = Self {
            spot_price,
            strike_price,
            time_to_maturity,
            risk_free_rate,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_param!(
            self.spot_price.is_finite() && self.spot_price > 0.0,
            "spot_price",
            self.spot_price,
            "must be > 0 and finite"
        );
        ensure_param!(
            self.strike_price.is_finite() && self.strike_price > 0.0,
            "strike_price",
            self.strike_price,
            "must be > 0 and finite"
        );
        ensure_param!(
            self.time_to_maturity.is_finite() && self.time_to_maturity >= 0.0,
            "time_to_maturity",
            self.time_to_maturity,
            "must be >= 0 and finite"
        );
        ensure_param!(
            self.risk_free_rate.is_finite(),
            "risk_free_rate",
            self.risk_free_rate,
            "must be finite"
        );
        Ok(())
    }

    pub fn with_volatility(&self, volatility: f64) -> PricingParameters {
        PricingParameters {
            spot_price: self.spot_price,
            strike_price: self.strike_price,
            time_to_maturity: self.time_to_maturity,
            volatility,
            risk_free_rate: self.risk_free_rate,
        }
    }

    pub fn discount_factor(&self) -> f64 {
        (-self.risk_free_rate * self.time_to_maturity).exp()
    }

    /// Zero-volatility price: intrinsic value along the deterministic forward
    /// path. This is the infimum of the model price over all volatilities.
    pub fn lower_bound(&self, option_type: OptionType) -> f64 {
        let discounted_strike = self.strike_price * self.discount_factor();
        match option_type {
            OptionType::Call => (self.spot_price - discounted_strike).max(0.0),
            OptionType::Put => (discounted_strike - self.spot_price).max(0.0),
        }
    }

    /// The side with zero value at σ = 0: a call when `S ≤ K·e^(-rT)`, a put
    /// otherwise.
    pub fn out_of_the_money(&self) -> OptionType {
        if self.spot_price > self.strike_price * self.discount_factor() {
            OptionType::Put
        } else {
            OptionType::Call
        }
    }

    /// Supremum of the model price as volatility grows without bound:
    /// `S` for a call, `K·e^(-rT)` for a put.
    pub fn upper_bound(&self, option_type: OptionType) -> f64 {
        match option_type {
            OptionType::Call => self.spot_price,
            OptionType::Put => self.strike_price * self.discount_factor(),
        }
    }
}

/// Output of the pricing core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    pub call_price: f64,
    pub put_price: f64,
    /// `None` when the model degenerates (`T = 0` or `σ = 0`)
    pub d1: Option<f64>,
    /// `None` when the model degenerates (`T = 0` or `σ = 0`)
    pub d2: Option<f64>,
}

impl PricingResult {
    pub fn price(&self, option_type: OptionType) -> f64 {
        match option_type {
            OptionType::Call => self.call_price,
            OptionType::Put => self.put_price,
        }
    }
}

/// Profit or loss of a long option position held to expiration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PnLPoint {
    pub spot_at_expiration: f64,
    pub premium_paid: f64,
    pub payoff: f64,
    pub profit_loss: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_type_parsing() {
        assert_eq!("call".parse::<OptionType>().unwrap(), OptionType::Call);
        assert_eq!(" PUT ".parse::<OptionType>().unwrap(), OptionType::Put);
        assert!("straddle".parse::<OptionType>().is_err());
    }

    #[test]
    fn test_parameter_validation() {
        assert!(PricingParameters::new(100.0, 100.0, 1.0, 0.2, 0.05).is_ok());
        assert!(PricingParameters::new(100.0, 100.0, 0.0, 0.0, -0.01).is_ok());

        assert!(PricingParameters::new(0.0, 100.0, 1.0, 0.2, 0.05).is_err()); // S = 0
        assert!(PricingParameters::new(100.0, -5.0, 1.0, 0.2, 0.05).is_err()); // K < 0
        assert!(PricingParameters::new(100.0, 100.0, -1.0, 0.2, 0.05).is_err()); // T < 0
        assert!(PricingParameters::new(100.0, 100.0, 1.0, -0.2, 0.05).is_err()); // σ < 0
        assert!(PricingParameters::new(100.0, 100.0, 1.0, 0.2, f64::NAN).is_err());
    }

    #[test]
    fn test_arbitrage_bounds() {
        let market = MarketParameters::new(100.0, 90.0, 1.0, 0.05).unwrap();
        let df = (-0.05_f64).exp();

        assert!((market.lower_bound(OptionType::Call) - (100.0 - 90.0 * df)).abs() < 1e-12);
        assert_eq!(market.lower_bound(OptionType::Put), 0.0);
        assert_eq!(market.upper_bound(OptionType::Call), 100.0);
        assert!((market.upper_bound(OptionType::Put) - 90.0 * df).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_the_money_leg() {
        let itm_call = MarketParameters::new(100.0, 90.0, 1.0, 0.05).unwrap();
        assert_eq!(itm_call.out_of_the_money(), OptionType::Put);
        assert_eq!(itm_call.lower_bound(itm_call.out_of_the_money()), 0.0);

        // Above the spot but below the forward
        let forward_itm = MarketParameters::new(100.0, 103.0, 1.0, 0.05).unwrap();
        assert_eq!(forward_itm.out_of_the_money(), OptionType::Put);

        let otm_call = MarketParameters::new(100.0, 120.0, 1.0, 0.05).unwrap();
        assert_eq!(otm_call.out_of_the_money(), OptionType::Call);
        assert_eq!(OptionType::Call.opposite(), OptionType::Put);
    }
}
