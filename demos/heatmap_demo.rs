// Example: heatmap_demo.rs
// Builds the spot × volatility price and P&L matrices shown next to a
// calculation, prints the call P&L table and renders it to heatmap.svg.
//
// Usage:
//     cargo run --example heatmap_demo [-- <config.toml>]
//
// Without a config file the default heatmap ranges are used
// (spot ± 20%, volatility 10%..50%, 10 steps each).

use std::env;
use std::error::Error;

use bsm_lib::{
    build_grid, generate_price_matrices, AxisSweep, EngineConfig, HeatmapGrid, HeatmapMetric,
    OptionType, PricingParameters, RangeSpec, SweepAxis,
};
use plotters::prelude::*;

fn print_grid(grid: &HeatmapGrid) {
    print!("{:>8}", format!("{}\\{}", grid.y_axis.label(), grid.x_axis.label()));
    for x in &grid.axis_x {
        print!("{:>9.2}", x);
    }
    println!();
    for (y, row) in grid.axis_y.iter().zip(&grid.values) {
        print!("{:>8.3}", y);
        for v in row {
            print!("{:>9.3}", v);
        }
        println!();
    }
}

/// Diverging colour: red for losses, green for gains, white at zero.
fn pnl_colour(value: f64, max_abs: f64) -> RGBColor {
    let t = if max_abs > 0.0 {
        (value / max_abs).clamp(-1.0, 1.0)
    } else {
        0.0
    };
    let fade = |amount: f64| (255.0 * (1.0 - amount.abs())) as u8;
    if t < 0.0 {
        RGBColor(255, fade(t), fade(t))
    } else {
        RGBColor(fade(t), 255, fade(t))
    }
}

fn render(grid: &HeatmapGrid, path: &str) -> Result<(), Box<dyn Error>> {
    let (rows, cols) = grid.shape();
    let max_abs = grid
        .values
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));

    let root = SVGBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(grid.metric.label(), ("sans-serif", 30))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0..cols, 0..rows)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(grid.x_axis.label())
        .y_desc(grid.y_axis.label())
        .x_label_formatter(&|i| {
            grid.axis_x
                .get(*i)
                .map(|v| format!("{v:.1}"))
                .unwrap_or_default()
        })
        .y_label_formatter(&|i| {
            grid.axis_y
                .get(*i)
                .map(|v| format!("{v:.2}"))
                .unwrap_or_default()
        })
        .draw()?;

    chart.draw_series(grid.values.iter().enumerate().flat_map(|(i, row)| {
        row.iter().enumerate().map(move |(j, v)| {
            Rectangle::new([(j, i), (j + 1, i + 1)], pnl_colour(*v, max_abs).filled())
        })
    }))?;

    println!("Heatmap saved to {path}");
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = match env::args().nth(1) {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };

    let base = PricingParameters::new(100.0, 100.0, 1.0, 0.2, 0.05)?;
    let spot_range = config.heatmap.spot_range(base.spot_price)?;
    let vol_range = config.heatmap.vol_range()?;

    let matrices = generate_price_matrices(&base, spot_range, vol_range)?;
    println!("Call P&L at expiration (premium {:.4})", bsm_lib::price(&base)?.call_price);
    print_grid(&matrices.call_pnl);

    if let Some((low, high)) = matrices.put_prices.value_range() {
        println!("\nPut prices range from {low:.4} to {high:.4}");
    }

    // Any metric over any two inputs, e.g. call delta over strike × maturity
    let delta = build_grid(
        &base,
        AxisSweep::new(SweepAxis::Strike, RangeSpec::new(80.0, 120.0, 5)?),
        AxisSweep::new(SweepAxis::Maturity, RangeSpec::new(0.1, 2.0, 5)?),
        HeatmapMetric::Delta(OptionType::Call),
    )?;
    println!();
    print_grid(&delta);

    render(&matrices.call_pnl, "heatmap.svg")?;
    Ok(())
}
