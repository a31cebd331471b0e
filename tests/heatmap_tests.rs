mod test_utils;

use bsm_lib::{
    build_grid, generate_price_matrices, price, price_option, AxisSweep, HeatmapConfig,
    HeatmapMetric, OptionType, RangeSpec, SweepAxis,
};
use test_utils::{assert_close, init_logging, textbook_params};

fn spot_sweep() -> AxisSweep {
    AxisSweep::new(SweepAxis::Spot, RangeSpec::new(80.0, 120.0, 5).unwrap())
}

fn vol_sweep() -> AxisSweep {
    AxisSweep::new(SweepAxis::Volatility, RangeSpec::new(0.1, 0.4, 5).unwrap())
}

/// Spot 80..120 and volatility 0.1..0.4 in five steps give a 5×5 grid.
#[test]
fn test_grid_shape_and_axes() {
    init_logging();
    let grid = build_grid(&textbook_params(), spot_sweep(), vol_sweep(), HeatmapMetric::CallPrice)
        .expect("grid build failed");

    assert_eq!(grid.shape(), (5, 5));
    assert_eq!(grid.values.len(), grid.axis_y.len());
    assert!(grid.values.iter().all(|row| row.len() == grid.axis_x.len()));
    assert_eq!(grid.axis_x, vec![80.0, 90.0, 100.0, 110.0, 120.0]);
    assert_eq!(grid.axis_y[0], 0.1);
    assert_eq!(grid.axis_y[4], 0.4);
}

/// Row i belongs to axis_y[i], column j to axis_x[j].
#[test]
fn test_cell_orientation() {
    let base = textbook_params();
    let grid = build_grid(&base, spot_sweep(), vol_sweep(), HeatmapMetric::CallPrice).unwrap();

    let expected = price(&base.with_spot(120.0).with_volatility(0.1)).unwrap().call_price;
    assert_eq!(grid.value(0, 4), Some(expected));
    let expected = price(&base.with_spot(80.0).with_volatility(0.4)).unwrap().call_price;
    assert_eq!(grid.value(4, 0), Some(expected));
    assert_eq!(grid.value(5, 0), None);
}

/// Expiration P&L depends only on the cell's spot: intrinsic value minus the
/// premium paid at the base parameters.
#[test]
fn test_price_matrices_pnl() {
    let base = textbook_params();
    let matrices = generate_price_matrices(
        &base,
        RangeSpec::new(80.0, 120.0, 5).unwrap(),
        RangeSpec::new(0.1, 0.4, 4).unwrap(),
    )
    .unwrap();
    let premium = price(&base).unwrap();

    for (i, row) in matrices.call_pnl.values.iter().enumerate() {
        for (j, &pnl) in row.iter().enumerate() {
            let spot = matrices.call_pnl.axis_x[j];
            assert_close(
                pnl,
                (spot - 100.0).max(0.0) - premium.call_price,
                1e-12,
                &format!("call pnl at ({i}, {j})"),
            );
            let put_pnl = matrices.put_pnl.values[i][j];
            assert_close(
                put_pnl,
                (100.0 - spot).max(0.0) - premium.put_price,
                1e-12,
                "put pnl",
            );
        }
    }

    // Price grids move with volatility down each column
    for j in 0..5 {
        for i in 1..4 {
            assert!(matrices.call_prices.values[i][j] > matrices.call_prices.values[i - 1][j]);
            assert!(matrices.put_prices.values[i][j] > matrices.put_prices.values[i - 1][j]);
        }
    }
}

/// Any two distinct inputs can be swept.
#[test]
fn test_strike_by_rate_sweep() {
    let base = textbook_params();
    let grid = build_grid(
        &base,
        AxisSweep::new(SweepAxis::Strike, RangeSpec::new(90.0, 110.0, 3).unwrap()),
        AxisSweep::new(SweepAxis::RiskFreeRate, RangeSpec::new(0.0, 0.1, 3).unwrap()),
        HeatmapMetric::MarkToModelPnl {
            option_type: OptionType::Put,
            premium_paid: 2.0,
        },
    )
    .unwrap();

    let expected = price_option(&base.with_strike(110.0).with_rate(0.05), OptionType::Put)
        .unwrap()
        - 2.0;
    assert_close(grid.values[1][2], expected, 1e-12, "mark to model");
}

/// Invalid sweeps are rejected.
#[test]
fn test_invalid_sweeps() {
    assert!(RangeSpec::new(80.0, 120.0, 1).is_err());
    assert!(RangeSpec::new(120.0, 80.0, 5).is_err());

    // A hand-built range bypassing the constructor is still validated
    let bad = AxisSweep::new(
        SweepAxis::Spot,
        RangeSpec {
            min: 80.0,
            max: 120.0,
            steps: 0,
        },
    );
    let err = build_grid(&textbook_params(), bad, vol_sweep(), HeatmapMetric::CallPrice).unwrap_err();
    assert!(err.is_invalid_parameter());

    let err = build_grid(
        &textbook_params(),
        spot_sweep(),
        vol_sweep(),
        HeatmapMetric::Pnl {
            option_type: OptionType::Call,
            premium_paid: -1.0,
        },
    )
    .unwrap_err();
    assert!(err.is_invalid_parameter());
}

/// The configured default ranges produce the 10×10 grids shown alongside a
/// calculation.
#[test]
fn test_default_heatmap_config() {
    let base = textbook_params();
    let config = HeatmapConfig::default();
    let matrices = generate_price_matrices(
        &base,
        config.spot_range(base.spot_price).unwrap(),
        config.vol_range().unwrap(),
    )
    .unwrap();
    assert_eq!(matrices.call_prices.shape(), (10, 10));
    assert_close(matrices.call_prices.axis_x[0], 80.0, 1e-12, "spot min");
    assert_close(matrices.call_prices.axis_x[9], 120.0, 1e-12, "spot max");
}
