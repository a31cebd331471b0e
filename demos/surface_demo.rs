// examples/surface_demo.rs

//! Demonstration of implied volatility surface construction
//!
//! This example shows how to:
//! 1. Build a theoretical smile surface and check the pricing/solver round trip
//! 2. Invert a strike × maturity price matrix read from CSV
//! 3. Inspect gaps where the solver could not converge
//! 4. Re-grid the market surface onto a regular mesh
//!
//! Usage:
//!     cargo run --example surface_demo [-- <prices.csv>]
//!
//! The CSV holds strikes in the first column and maturities (years) in the
//! header row. Without a file a small synthetic matrix is used.

use std::env;
use std::fs::File;

use anyhow::{Context, Result};
use bsm_lib::surface::io::{read_quote_matrix, write_surface};
use bsm_lib::{
    build_surface_from_quotes, default_configs, theoretical_surface_from_config, OptionType,
    RegridConfig, SurfaceConfig, TimeInterpolation, UnderlyingParameters,
};

const DEMO_MATRIX: &str = "\
strike,0.25,0.5,1.0
80,20.99,21.98,24.20
90,11.69,13.27,16.20
100,4.61,6.89,10.45
110,1.19,2.94,6.04
120,0.21,1.06,3.25
130,0.03,150.0,1.63
";

fn main() -> Result<()> {
    env_logger::init();

    let underlying = UnderlyingParameters::new(100.0, 0.05)?;
    let solver = default_configs::fast();

    println!("Step 1: Theoretical surface...");
    let surface_config = SurfaceConfig::default();
    let theoretical =
        theoretical_surface_from_config(&underlying, &surface_config, OptionType::Call, &solver)?;
    println!(
        "  {} nodes, {} converged, max round-trip error {:.2e}",
        theoretical.len(),
        theoretical.converged_count(),
        theoretical.max_round_trip_error().unwrap_or(f64::NAN)
    );
    let mesh = theoretical.to_mesh();
    let (rows, cols) = mesh.shape();
    println!("  mesh {rows} maturities x {cols} strikes");
    println!(
        "  σ(K={:.1}, T={:.2}) = {:.4}",
        mesh.strikes[cols / 2],
        mesh.maturities[rows / 2],
        mesh.values[rows / 2][cols / 2]
    );

    println!("\nStep 2: Market surface...");
    let quotes = match env::args().nth(1) {
        Some(path) => {
            let file = File::open(&path).with_context(|| format!("failed to open {path}"))?;
            read_quote_matrix(file)?
        }
        None => read_quote_matrix(DEMO_MATRIX.as_bytes())?,
    };
    let market = build_surface_from_quotes(&quotes, &underlying, OptionType::Call, &solver)?;
    println!(
        "  {} quotes, {} converged",
        market.len(),
        market.converged_count()
    );

    println!("\nStep 3: Gaps...");
    for gap in market.gaps() {
        println!(
            "  K = {:.1}, T = {:.2}, price = {:.4}: no implied volatility",
            gap.strike, gap.time_to_maturity, gap.market_price
        );
    }

    println!("\nStep 4: Re-gridding...");
    let regrid = RegridConfig {
        allow_extrapolation: false,
        time_interpolation: TimeInterpolation::LinearVariance,
    };
    let strikes = [85.0, 95.0, 105.0, 115.0];
    let maturities = [0.25, 0.5, 0.75, 1.0];
    let mesh = market.regrid(&strikes, &maturities, &regrid)?;

    print!("{:>6}", "T\\K");
    for k in &mesh.strikes {
        print!("{:>9.1}", k);
    }
    println!();
    for (t, row) in mesh.maturities.iter().zip(&mesh.values) {
        print!("{:>6.2}", t);
        for v in row {
            if v.is_nan() {
                print!("{:>9}", "-");
            } else {
                print!("{:>9.4}", v);
            }
        }
        println!();
    }

    write_surface(&market, File::create("surface.csv")?)?;
    println!("\nSurface saved to surface.csv");
    Ok(())
}
