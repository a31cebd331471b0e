use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::{ImpliedVolatilityPoint, MarketQuote, VolatilitySurface};
use crate::config::{SolverConfig, SurfaceConfig};
use crate::ensure_param;
use crate::error::{PricingError, Result};
use crate::implied_vol::implied_volatility_with;
use crate::models::bs::price_unchecked;
use crate::models::traits::VolatilityFunction;
use crate::models::utils::is_strictly_increasing;
use crate::types::{MarketParameters, OptionType};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Largest |implied − reference| a theoretical node may show before the round
/// trip is reported.
const ROUND_TRIP_WARN_THRESHOLD: f64 = 1e-4;

/// The part of the pricing inputs shared by every node of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingParameters {
    pub spot_price: f64,
    pub risk_free_rate: f64,
}

impl UnderlyingParameters {
    pub fn new(spot_price: f64, risk_free_rate: f64) -> Result<Self> {
        let params = Self {
            spot_price,
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
            self.risk_free_rate.is_finite(),
            "risk_free_rate",
            self.risk_free_rate,
            "must be finite"
        );
        Ok(())
    }

    /// Market parameters for one node.
    pub fn at(&self, strike: f64, maturity: f64) -> Result<MarketParameters> {
        MarketParameters::new(self.spot_price, strike, maturity, self.risk_free_rate)
    }
}

pub(crate) fn check_axis(name: &'static str, values: &[f64], positive: bool) -> Result<()> {
    ensure_param!(!values.is_empty(), name, 0.0, "must not be empty");
    for &v in values {
        let in_domain = v.is_finite() && if positive { v > 0.0 } else { v >= 0.0 };
        ensure_param!(
            in_domain,
            name,
            v,
            "values must be {} and finite",
            if positive { "> 0" } else { ">= 0" }
        );
    }
    ensure_param!(
        is_strictly_increasing(values),
        name,
        f64::NAN,
        "must be strictly increasing"
    );
    Ok(())
}

/// Inverts one price; non-convergence becomes a gap, invalid input aborts.
fn invert(
    observed_price: f64,
    market: &MarketParameters,
    option_type: OptionType,
    config: &SolverConfig,
) -> Result<Option<f64>> {
    match implied_volatility_with(observed_price, market, option_type, config) {
        Ok(sigma) => Ok(Some(sigma)),
        Err(PricingError::NotConverged(reason)) => {
            warn!(
                "no implied vol for {} K={} T={} price={}: {}",
                option_type, market.strike_price, market.time_to_maturity, observed_price, reason
            );
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Prices every (strike, maturity) node at the volatility `vol_fn` assigns it.
///
/// With `round_trip` set, each node's out-of-the-money price is fed back
/// through the solver and the recovered σ becomes the point's `implied_vol`; nodes where pricing
/// and inversion disagree by more than 1e-4 are logged. Without it the
/// assigned σ is used directly. `reference_vol` always carries the assigned σ.
///
/// Strikes must be positive and maturities non-negative, both strictly
/// increasing.
///
/// # Example
///
/// ```rust
/// use bsm_lib::models::smile::SmileVolatility;
/// use bsm_lib::surface::{build_theoretical_surface, UnderlyingParameters};
/// use bsm_lib::{OptionType, SolverConfig};
///
/// let underlying = UnderlyingParameters::new(100.0, 0.05)?;
/// let surface = build_theoretical_surface(
///     &underlying,
///     &[80.0, 100.0, 120.0],
///     &[0.5, 1.0],
///     &SmileVolatility::default(),
///     OptionType::Call,
///     Some(&SolverConfig::default()),
/// )?;
/// assert_eq!(surface.len(), 6);
/// assert!(surface.max_round_trip_error().unwrap() < 1e-6);
/// # Ok::<(), bsm_lib::PricingError>(())
/// ```
pub fn build_theoretical_surface(
    underlying: &UnderlyingParameters,
    strikes: &[f64],
    maturities: &[f64],
    vol_fn: &dyn VolatilityFunction,
    option_type: OptionType,
    round_trip: Option<&SolverConfig>,
) -> Result<VolatilitySurface> {
    underlying.validate()?;
    vol_fn.validate()?;
    check_axis("strikes", strikes, true)?;
    check_axis("maturities", maturities, false)?;
    if let Some(config) = round_trip {
        config.validate()?;
    }

    let nodes: Vec<(f64, f64)> = maturities
        .iter()
        .flat_map(|&t| strikes.iter().map(move |&k| (k, t)))
        .collect();
    debug!(
        "building theoretical {} surface on {} strikes x {} maturities",
        option_type,
        strikes.len(),
        maturities.len()
    );

    let build_point = |&(strike, maturity): &(f64, f64)| -> Result<ImpliedVolatilityPoint> {
        let market = underlying.at(strike, maturity)?;
        let sigma = vol_fn.volatility(strike, maturity, underlying.spot_price);
        ensure_param!(
            sigma.is_finite() && sigma >= 0.0,
            "volatility",
            sigma,
            "volatility function returned an invalid value at K={} T={}",
            strike,
            maturity
        );

        let prices = price_unchecked(&market.with_volatility(sigma));
        let market_price = prices.price(option_type);
        let implied_vol = match round_trip {
            // Both legs share σ by parity; invert the one without intrinsic value
            Some(config) => {
                let leg = market.out_of_the_money();
                invert(prices.price(leg), &market, leg, config)?
            }
            None => Some(sigma),
        };

        if let Some(implied) = implied_vol {
            let error = (implied - sigma).abs();
            if error > ROUND_TRIP_WARN_THRESHOLD {
                warn!(
                    "round trip mismatch at K={} T={}: priced at {:.6}, recovered {:.6}",
                    strike, maturity, sigma, implied
                );
            }
        }

        Ok(ImpliedVolatilityPoint {
            strike,
            time_to_maturity: maturity,
            market_price,
            implied_vol,
            reference_vol: Some(sigma),
        })
    };

    #[cfg(feature = "parallel")]
    let points = nodes
        .par_iter()
        .map(build_point)
        .collect::<Result<Vec<_>>>()?;

    #[cfg(not(feature = "parallel"))]
    let points = nodes
        .iter()
        .map(build_point)
        .collect::<Result<Vec<_>>>()?;

    let surface = VolatilitySurface::new(
        underlying.spot_price,
        underlying.risk_free_rate,
        option_type,
        points,
    );
    info!(
        "theoretical surface: {}/{} nodes converged",
        surface.converged_count(),
        surface.len()
    );
    Ok(surface)
}

/// Theoretical surface on the strike and expiry axes of a [`SurfaceConfig`],
/// using its smile parameters.
pub fn theoretical_surface_from_config(
    underlying: &UnderlyingParameters,
    config: &SurfaceConfig,
    option_type: OptionType,
    solver: &SolverConfig,
) -> Result<VolatilitySurface> {
    underlying.validate()?;
    let strikes = config.strike_range(underlying.spot_price)?.values();
    let maturities = config.expiry_range()?.values();
    let round_trip = config.round_trip_check.then_some(solver);
    build_theoretical_surface(
        underlying,
        &strikes,
        &maturities,
        &config.smile(),
        option_type,
        round_trip,
    )
}

/// Inverts one observed price per quote.
///
/// Quotes the solver cannot invert (below intrinsic, above the upper bound,
/// expired, or not converged within the iteration cap) are kept with
/// `implied_vol = None`. A quote with an invalid strike, maturity or price
/// aborts the whole build.
pub fn build_surface_from_quotes(
    quotes: &[MarketQuote],
    underlying: &UnderlyingParameters,
    option_type: OptionType,
    config: &SolverConfig,
) -> Result<VolatilitySurface> {
    underlying.validate()?;
    config.validate()?;
    debug!(
        "inverting {} {} quotes with {:?}",
        quotes.len(),
        option_type,
        config.method
    );

    let build_point = |quote: &MarketQuote| -> Result<ImpliedVolatilityPoint> {
        let market = underlying.at(quote.strike, quote.maturity)?;
        ensure_param!(
            quote.market_price.is_finite() && quote.market_price >= 0.0,
            "market_price",
            quote.market_price,
            "must be >= 0 and finite (K={}, T={})",
            quote.strike,
            quote.maturity
        );
        Ok(ImpliedVolatilityPoint {
            strike: quote.strike,
            time_to_maturity: quote.maturity,
            market_price: quote.market_price,
            implied_vol: invert(quote.market_price, &market, option_type, config)?,
            reference_vol: None,
        })
    };

    #[cfg(feature = "parallel")]
    let points = quotes
        .par_iter()
        .map(build_point)
        .collect::<Result<Vec<_>>>()?;

    #[cfg(not(feature = "parallel"))]
    let points = quotes
        .iter()
        .map(build_point)
        .collect::<Result<Vec<_>>>()?;

    let surface = VolatilitySurface::new(
        underlying.spot_price,
        underlying.risk_free_rate,
        option_type,
        points,
    );
    let gaps = surface.len() - surface.converged_count();
    if gaps > 0 {
        warn!("{gaps} of {} quotes did not converge", surface.len());
    }
    Ok(surface)
}

/// Flattens a `prices[maturity][strike]` matrix into quotes. NaN cells are
/// missing quotes and are skipped.
pub fn quotes_from_price_matrix(
    strikes: &[f64],
    maturities: &[f64],
    prices: &[Vec<f64>],
) -> Result<Vec<MarketQuote>> {
    ensure_param!(
        prices.len() == maturities.len(),
        "prices",
        prices.len(),
        "expected {} maturity rows",
        maturities.len()
    );

    let mut quotes = Vec::with_capacity(strikes.len() * maturities.len());
    for (row, (&maturity, row_prices)) in maturities.iter().zip(prices).enumerate() {
        ensure_param!(
            row_prices.len() == strikes.len(),
            "prices",
            row_prices.len(),
            "row {} has {} columns, expected {}",
            row,
            row_prices.len(),
            strikes.len()
        );
        quotes.extend(
            strikes
                .iter()
                .zip(row_prices)
                .filter(|(_, price)| !price.is_nan())
                .map(|(&strike, &market_price)| MarketQuote {
                    strike,
                    maturity,
                    market_price,
                }),
        );
    }
    Ok(quotes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::smile::{ConstantVolatility, SmileVolatility};

    fn underlying() -> UnderlyingParameters {
        UnderlyingParameters::new(100.0, 0.05).unwrap()
    }

    #[test]
    fn test_theoretical_without_round_trip_uses_assigned_vol() {
        let smile = SmileVolatility::default();
        let surface = build_theoretical_surface(
            &underlying(),
            &[90.0, 100.0, 110.0],
            &[0.25, 1.0],
            &smile,
            OptionType::Put,
            None,
        )
        .unwrap();

        assert_eq!(surface.len(), 6);
        for p in &surface.points {
            let expected = smile.volatility(p.strike, p.time_to_maturity, 100.0);
            assert_eq!(p.implied_vol, Some(expected));
            assert_eq!(p.reference_vol, Some(expected));
            assert!(p.market_price > 0.0);
        }
    }

    #[test]
    fn test_expired_nodes_become_gaps_on_round_trip() {
        let surface = build_theoretical_surface(
            &underlying(),
            &[90.0, 110.0],
            &[0.0, 1.0],
            &ConstantVolatility(0.3),
            OptionType::Call,
            Some(&SolverConfig::default()),
        )
        .unwrap();

        assert_eq!(surface.converged_count(), 2);
        assert!(surface.gaps().all(|p| p.time_to_maturity == 0.0));
    }

    #[test]
    fn test_axes_must_be_increasing() {
        let result = build_theoretical_surface(
            &underlying(),
            &[110.0, 90.0],
            &[1.0],
            &ConstantVolatility(0.3),
            OptionType::Call,
            None,
        );
        assert!(result.unwrap_err().is_invalid_parameter());

        let result = build_theoretical_surface(
            &underlying(),
            &[90.0, 110.0],
            &[],
            &ConstantVolatility(0.3),
            OptionType::Call,
            None,
        );
        assert!(result.unwrap_err().is_invalid_parameter());
    }

    #[test]
    fn test_quote_gap_kept_and_invalid_quote_aborts() {
        let quotes = vec![
            MarketQuote {
                strike: 100.0,
                maturity: 1.0,
                market_price: 10.450583572,
            },
            MarketQuote {
                strike: 100.0,
                maturity: 0.5,
                market_price: 150.0,
            },
        ];
        let surface =
            build_surface_from_quotes(&quotes, &underlying(), OptionType::Call, &SolverConfig::default())
                .unwrap();
        assert_eq!(surface.len(), 2);
        assert_eq!(surface.converged_count(), 1);
        // Sorted by maturity: the 0.5y gap comes first
        assert_eq!(surface.points[0].implied_vol, None);
        assert!((surface.points[1].implied_vol.unwrap() - 0.2).abs() < 1e-6);

        let bad = [MarketQuote {
            strike: -1.0,
            maturity: 1.0,
            market_price: 5.0,
        }];
        let err = build_surface_from_quotes(&bad, &underlying(), OptionType::Call, &SolverConfig::default())
            .unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    #[test]
    fn test_quotes_from_price_matrix() {
        let quotes = quotes_from_price_matrix(
            &[90.0, 100.0],
            &[0.5, 1.0],
            &[vec![12.0, f64::NAN], vec![15.0, 10.0]],
        )
        .unwrap();
        assert_eq!(quotes.len(), 3);
        assert_eq!(
            quotes[1],
            MarketQuote {
                strike: 90.0,
                maturity: 1.0,
                market_price: 15.0
            }
        );

        assert!(quotes_from_price_matrix(&[90.0, 100.0], &[0.5], &[vec![1.0]]).is_err());
    }
}
