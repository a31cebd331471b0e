//! Grid and surface evaluation on the rayon pool.
//!
//! Compiled only with the `parallel` feature:
//!
//! ```text
//! cargo test --features parallel --test parallel_tests
//! ```
//!
//! Every cell and point must match one evaluated on its own, in the same
//! order as the sequential build.
#![cfg(feature = "parallel")]

mod test_utils;

use bsm_lib::{
    build_grid, build_surface_from_quotes, build_theoretical_surface, generate_price_matrices,
    greeks, implied_volatility_with, price, price_option, AxisSweep, HeatmapMetric, MarketQuote,
    OptionType, RangeSpec, SmileVolatility, SolverConfig, SweepAxis, UnderlyingParameters,
};
use test_utils::{init_logging, textbook_params};

/// All four price matrices agree bit for bit with direct pricing.
#[test]
fn test_price_matrices_match_direct_pricing() {
    init_logging();
    let base = textbook_params();
    let matrices = generate_price_matrices(
        &base,
        RangeSpec::new(60.0, 140.0, 17).unwrap(),
        RangeSpec::new(0.05, 0.8, 16).unwrap(),
    )
    .unwrap();
    let premium = price(&base).unwrap();

    assert_eq!(matrices.call_prices.shape(), (16, 17));
    for (i, &vol) in matrices.call_prices.axis_y.iter().enumerate() {
        for (j, &spot) in matrices.call_prices.axis_x.iter().enumerate() {
            let cell = price(&base.with_spot(spot).with_volatility(vol)).unwrap();
            assert_eq!(matrices.call_prices.values[i][j], cell.call_price);
            assert_eq!(matrices.put_prices.values[i][j], cell.put_price);
            assert_eq!(
                matrices.call_pnl.values[i][j],
                (spot - base.strike_price).max(0.0) - premium.call_price
            );
            assert_eq!(
                matrices.put_pnl.values[i][j],
                (base.strike_price - spot).max(0.0) - premium.put_price
            );
        }
    }
}

/// Rows stay attached to their axis value on a strike × maturity delta grid.
#[test]
fn test_greek_grid_rows_in_order() {
    let base = textbook_params();
    let grid = build_grid(
        &base,
        AxisSweep::new(SweepAxis::Strike, RangeSpec::new(70.0, 130.0, 13).unwrap()),
        AxisSweep::new(SweepAxis::Maturity, RangeSpec::new(0.1, 3.0, 30).unwrap()),
        HeatmapMetric::Delta(OptionType::Put),
    )
    .unwrap();

    for (i, &maturity) in grid.axis_y.iter().enumerate() {
        for (j, &strike) in grid.axis_x.iter().enumerate() {
            let expected = greeks(&base.with_strike(strike).with_maturity(maturity), OptionType::Put)
                .unwrap()
                .delta;
            assert_eq!(grid.values[i][j], expected);
        }
    }
}

/// A theoretical surface equals the union of its single-node surfaces.
#[test]
fn test_theoretical_surface_matches_single_nodes() {
    init_logging();
    let underlying = UnderlyingParameters::new(100.0, 0.03).unwrap();
    let strikes: Vec<f64> = (0..15).map(|i| 65.0 + 5.0 * i as f64).collect();
    let maturities = [0.1, 0.25, 0.5, 1.0, 2.0];
    let smile = SmileVolatility::default();
    let config = SolverConfig::production();

    let surface = build_theoretical_surface(
        &underlying,
        &strikes,
        &maturities,
        &smile,
        OptionType::Call,
        Some(&config),
    )
    .unwrap();
    assert_eq!(surface.len(), strikes.len() * maturities.len());

    let mut expected = Vec::new();
    for &maturity in &maturities {
        for &strike in &strikes {
            let single = build_theoretical_surface(
                &underlying,
                &[strike],
                &[maturity],
                &smile,
                OptionType::Call,
                Some(&config),
            )
            .unwrap();
            expected.extend(single.points);
        }
    }
    assert_eq!(surface.points, expected);
}

/// Market quotes invert to the same σ as the scalar solver, gaps included.
#[test]
fn test_market_surface_matches_scalar_solver() {
    init_logging();
    let underlying = UnderlyingParameters::new(100.0, 0.05).unwrap();
    let config = SolverConfig::default();
    let mut quotes = Vec::new();
    for &maturity in &[0.25, 0.5, 1.0] {
        for &strike in &[80.0, 90.0, 100.0, 110.0, 120.0] {
            let market = underlying.at(strike, maturity).unwrap();
            let sigma = 0.15 + 0.1 * maturity;
            quotes.push(MarketQuote {
                strike,
                maturity,
                market_price: price_option(&market.with_volatility(sigma), OptionType::Put)
                    .unwrap(),
            });
        }
    }
    // No volatility reaches a put worth more than the discounted strike
    quotes[7].market_price = 150.0;

    let surface = build_surface_from_quotes(&quotes, &underlying, OptionType::Put, &config).unwrap();
    assert_eq!(surface.len(), quotes.len());
    assert_eq!(surface.converged_count(), quotes.len() - 1);

    for (point, quote) in surface.points.iter().zip(&quotes) {
        assert_eq!(point.strike, quote.strike);
        assert_eq!(point.time_to_maturity, quote.maturity);
        let market = underlying.at(quote.strike, quote.maturity).unwrap();
        let scalar = implied_volatility_with(quote.market_price, &market, OptionType::Put, &config).ok();
        assert_eq!(point.implied_vol, scalar);
    }
}
