// examples/pricing_demo.rs

//! Demonstration of Black-Scholes pricing, Greeks, P&L and implied volatility
//!
//! This example shows how to:
//! 1. Price a call and a put
//! 2. Compute their Greeks
//! 3. Evaluate P&L at expiration for a range of outcomes
//! 4. Recover the volatility from the model price with each solver method
//!
//! Run with `RUST_LOG=debug` to see solver diagnostics.

use anyhow::Result;
use bsm_lib::{
    breakeven, default_configs, greeks, price, profit_loss, solve, MarketParameters, OptionType,
    PricingParameters, SolverMethod,
};

fn main() -> Result<()> {
    env_logger::init();

    println!("Black-Scholes Pricing Demo");
    println!("==========================");

    let params = PricingParameters::new(100.0, 105.0, 0.5, 0.25, 0.04)?;
    println!(
        "S = {:.2}, K = {:.2}, T = {:.2}y, σ = {:.0}%, r = {:.1}%",
        params.spot_price,
        params.strike_price,
        params.time_to_maturity,
        params.volatility * 100.0,
        params.risk_free_rate * 100.0
    );

    println!("\nStep 1: Pricing...");
    let result = price(&params)?;
    println!("  Call price: {:.4}", result.call_price);
    println!("  Put price:  {:.4}", result.put_price);
    if let (Some(d1), Some(d2)) = (result.d1, result.d2) {
        println!("  d1 = {:.6}, d2 = {:.6}", d1, d2);
    }
    let parity = result.call_price - result.put_price
        - (params.spot_price - params.strike_price * params.discount_factor());
    println!("  Put-call parity residual: {:.2e}", parity);

    println!("\nStep 2: Greeks...");
    println!(
        "{:<6} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Type", "Delta", "Gamma", "Vega", "Theta", "Rho"
    );
    println!("{}", "-".repeat(62));
    for option_type in [OptionType::Call, OptionType::Put] {
        let g = greeks(&params, option_type)?;
        println!(
            "{:<6} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
            option_type, g.delta, g.gamma, g.vega, g.theta, g.rho
        );
    }

    println!("\nStep 3: P&L at expiration (long call)...");
    println!(
        "  Breakeven: {:.2}",
        breakeven(OptionType::Call, params.strike_price, result.call_price)
    );
    println!("{:<12} {:>10} {:>10}", "Spot at T", "Payoff", "P&L");
    for spot in [80.0, 95.0, 105.0, 110.0, 125.0] {
        let point = profit_loss(OptionType::Call, spot, params.strike_price, result.call_price)?;
        println!(
            "{:<12.2} {:>10.4} {:>10.4}",
            point.spot_at_expiration, point.payoff, point.profit_loss
        );
    }

    println!("\nStep 4: Implied volatility round trip...");
    let market = params.market();
    for method in [SolverMethod::Hybrid, SolverMethod::Bisection, SolverMethod::Brent] {
        let config = default_configs::production().with_method(method);
        let outcome = solve(result.call_price, &market, OptionType::Call, &config)?;
        println!(
            "  {:<10} σ = {:.10}  iterations = {:>3}  residual = {:.2e}",
            format!("{method:?}"),
            outcome.volatility,
            outcome.iterations,
            outcome.residual
        );
    }

    // Prices outside the no-arbitrage bounds have no implied volatility
    let impossible = market.upper_bound(OptionType::Call) + 1.0;
    match solve(impossible, &market, OptionType::Call, &default_configs::fast()) {
        Ok(outcome) => println!("  unexpected solution {:.6}", outcome.volatility),
        Err(e) => println!("  price {:.2}: {}", impossible, e),
    }

    let expired = MarketParameters::new(100.0, 90.0, 0.0, 0.04)?;
    if let Err(e) = solve(10.0, &expired, OptionType::Call, &default_configs::fast()) {
        println!("  expired option: {}", e);
    }

    Ok(())
}
