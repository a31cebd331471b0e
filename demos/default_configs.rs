use bsm_lib::{default_configs, implied_volatility_with, price_option, MarketParameters, OptionType};

fn main() {
    // A slightly out-of-the-money put priced at 30% volatility
    let market = match MarketParameters::new(100.0, 95.0, 0.25, 0.03) {
        Ok(market) => market,
        Err(e) => {
            eprintln!("invalid market parameters: {e}");
            return;
        }
    };
    let observed = match price_option(&market.with_volatility(0.30), OptionType::Put) {
        Ok(price) => price,
        Err(e) => {
            eprintln!("pricing failed: {e}");
            return;
        }
    };

    println!("BSM-lib Default Configuration Examples\n");
    println!("Observed put price: {observed:.6}\n");

    let presets = [
        ("Fast", "development, interactive use", default_configs::fast()),
        ("Production", "live pricing", default_configs::production()),
        ("Research", "model validation", default_configs::research()),
        ("Minimal", "quick checks", default_configs::minimal()),
    ];

    for (i, (name, use_case, config)) in presets.iter().enumerate() {
        println!("{}. {} Configuration:", i + 1, name);
        println!("   Method: {:?}", config.method);
        println!("   Tolerance: {:.1e}", config.tolerance);
        println!("   Max iterations: {}", config.max_iterations);
        println!(
            "   Volatility bracket: [{:.0e}, {:.1}]",
            config.min_volatility, config.max_volatility
        );
        match implied_volatility_with(observed, &market, OptionType::Put, config) {
            Ok(sigma) => println!("   Recovered σ: {sigma:.10}"),
            Err(e) => println!("   Solver failed: {e}"),
        }
        println!("   Use case: {use_case}\n");
    }
}
