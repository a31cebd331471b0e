//! Two-dimensional parameter sweeps over the pricing core.
//!
//! A heatmap overrides two fields of a base set of [`PricingParameters`] with
//! the points of two [`RangeSpec`]s and evaluates one metric per cell. Cells are
//! independent, so there is no memoisation across them; with the `parallel`
//! feature rows are evaluated on the rayon thread pool, which yields the same
//! matrix as the sequential default.
//!
//! Layout: `values[i][j]` belongs to `axis_y[i]` and `axis_x[j]`, both axes
//! ascending.

pub mod range;

pub use range::RangeSpec;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::ensure_param;
use crate::error::{PricingError, Result};
use crate::models::bs::{greeks::greeks_unchecked, price, price_unchecked};
use crate::pnl::profit_loss;
use crate::types::{OptionType, PricingParameters};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Pricing input that a sweep axis overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepAxis {
    Spot,
    Strike,
    Volatility,
    Maturity,
    RiskFreeRate,
}

impl SweepAxis {
    /// Returns `params` with this axis set to `value`.
    pub fn apply(&self, params: PricingParameters, value: f64) -> PricingParameters {
        match self {
            SweepAxis::Spot => params.with_spot(value),
            SweepAxis::Strike => params.with_strike(value),
            SweepAxis::Volatility => params.with_volatility(value),
            SweepAxis::Maturity => params.with_maturity(value),
            SweepAxis::RiskFreeRate => params.with_rate(value),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SweepAxis::Spot => "Spot Price",
            SweepAxis::Strike => "Strike Price",
            SweepAxis::Volatility => "Volatility",
            SweepAxis::Maturity => "Time to Maturity (Years)",
            SweepAxis::RiskFreeRate => "Risk-Free Rate",
        }
    }
}

/// One axis of a heatmap: which input to override and with what points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisSweep {
    pub axis: SweepAxis,
    pub range: RangeSpec,
}

impl AxisSweep {
    pub fn new(axis: SweepAxis, range: RangeSpec) -> Self {
        Self { axis, range }
    }
}

/// Quantity evaluated in each heatmap cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatmapMetric {
    CallPrice,
    PutPrice,
    /// Buyer's profit/loss at expiration, with the cell's spot as the
    /// spot at expiration
    Pnl {
        option_type: OptionType,
        premium_paid: f64,
    },
    /// Model value under the cell's parameters minus the premium paid
    MarkToModelPnl {
        option_type: OptionType,
        premium_paid: f64,
    },
    Delta(OptionType),
    Gamma,
    Vega,
}

impl HeatmapMetric {
    pub fn label(&self) -> String {
        match self {
            HeatmapMetric::CallPrice => "call_price".to_string(),
            HeatmapMetric::PutPrice => "put_price".to_string(),
            HeatmapMetric::Pnl { option_type, .. } => format!("{option_type}_pnl"),
            HeatmapMetric::MarkToModelPnl { option_type, .. } => {
                format!("{option_type}_mark_to_model_pnl")
            }
            HeatmapMetric::Delta(option_type) => format!("{option_type}_delta"),
            HeatmapMetric::Gamma => "gamma".to_string(),
            HeatmapMetric::Vega => "vega".to_string(),
        }
    }

    fn validate(&self) -> Result<()> {
        if let HeatmapMetric::Pnl { premium_paid, .. }
        | HeatmapMetric::MarkToModelPnl { premium_paid, .. } = self
        {
            ensure_param!(
                premium_paid.is_finite() && *premium_paid >= 0.0,
                "premium_paid",
                *premium_paid,
                "must be >= 0 and finite"
            );
        }
        Ok(())
    }

    /// Evaluates the metric for one cell whose parameters are already valid.
    fn evaluate(&self, params: &PricingParameters) -> Result<f64> {
        let value = match *self {
            HeatmapMetric::CallPrice => price_unchecked(params).call_price,
            HeatmapMetric::PutPrice => price_unchecked(params).put_price,
            HeatmapMetric::Pnl {
                option_type,
                premium_paid,
            } => {
                profit_loss(
                    option_type,
                    params.spot_price,
                    params.strike_price,
                    premium_paid,
                )?
                .profit_loss
            }
            HeatmapMetric::MarkToModelPnl {
                option_type,
                premium_paid,
            } => price_unchecked(params).price(option_type) - premium_paid,
            HeatmapMetric::Delta(option_type) => greeks_unchecked(params, option_type).delta,
            HeatmapMetric::Gamma => greeks_unchecked(params, OptionType::Call).gamma,
            HeatmapMetric::Vega => greeks_unchecked(params, OptionType::Call).vega,
        };
        Ok(value)
    }
}

/// A metric evaluated over a two-axis sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapGrid {
    pub metric: HeatmapMetric,
    pub x_axis: SweepAxis,
    pub y_axis: SweepAxis,
    /// Ascending points of the x sweep (columns)
    pub axis_x: Vec<f64>,
    /// Ascending points of the y sweep (rows)
    pub axis_y: Vec<f64>,
    /// `values[i][j]` is the metric at `axis_y[i]`, `axis_x[j]`
    pub values: Vec<Vec<f64>>,
}

impl HeatmapGrid {
    /// `(rows, columns)`, i.e. `(axis_y.len(), axis_x.len())`.
    pub fn shape(&self) -> (usize, usize) {
        (self.axis_y.len(), self.axis_x.len())
    }

    pub fn value(&self, row: usize, column: usize) -> Option<f64> {
        self.values.get(row)?.get(column).copied()
    }

    /// Smallest and largest cell values, for colour scaling.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .flatten()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Evaluates `metric` over every (x, y) cell.
///
/// # Errors
///
/// `InvalidParameter` when a range is malformed, both sweeps target the same
/// input, the base parameters are invalid, or a sweep drives an input out of
/// its domain (for example a spot range reaching zero).
///
/// # Example
///
/// ```rust
/// use bsm_lib::{build_grid, AxisSweep, HeatmapMetric, PricingParameters, RangeSpec, SweepAxis};
///
/// let base = PricingParameters::new(100.0, 100.0, 1.0, 0.2, 0.05)?;
/// let grid = build_grid(
///     &base,
///     AxisSweep::new(SweepAxis::Spot, RangeSpec::new(80.0, 120.0, 5)?),
///     AxisSweep::new(SweepAxis::Volatility, RangeSpec::new(0.1, 0.4, 5)?),
///     HeatmapMetric::CallPrice,
/// )?;
/// assert_eq!(grid.shape(), (5, 5));
/// assert_eq!(grid.axis_x, vec![80.0, 90.0, 100.0, 110.0, 120.0]);
/// # Ok::<(), bsm_lib::PricingError>(())
/// ```
pub fn build_grid(
    base_params: &PricingParameters,
    sweep_x: AxisSweep,
    sweep_y: AxisSweep,
    metric: HeatmapMetric,
) -> Result<HeatmapGrid> {
    base_params.validate()?;
    sweep_x.range.validate()?;
    sweep_y.range.validate()?;
    metric.validate()?;
    if sweep_x.axis == sweep_y.axis {
        return Err(PricingError::invalid(
            "sweep_y",
            f64::NAN,
            format!("both axes sweep {:?}", sweep_x.axis),
        ));
    }

    // Every input domain is an interval, so valid corners imply valid cells.
    for x in [sweep_x.range.min, sweep_x.range.max] {
        for y in [sweep_y.range.min, sweep_y.range.max] {
            sweep_y
                .axis
                .apply(sweep_x.axis.apply(*base_params, x), y)
                .validate()?;
        }
    }

    let axis_x = sweep_x.range.values();
    let axis_y = sweep_y.range.values();
    debug!(
        "building {}x{} {} heatmap ({:?} x {:?})",
        axis_y.len(),
        axis_x.len(),
        metric.label(),
        sweep_y.axis,
        sweep_x.axis
    );

    let evaluate_row = |y: &f64| -> Result<Vec<f64>> {
        let row_params = sweep_y.axis.apply(*base_params, *y);
        axis_x
            .iter()
            .map(|&x| metric.evaluate(&sweep_x.axis.apply(row_params, x)))
            .collect()
    };

    #[cfg(feature = "parallel")]
    let values = axis_y
        .par_iter()
        .map(evaluate_row)
        .collect::<Result<Vec<_>>>()?;

    #[cfg(not(feature = "parallel"))]
    let values = axis_y
        .iter()
        .map(evaluate_row)
        .collect::<Result<Vec<_>>>()?;

    Ok(HeatmapGrid {
        metric,
        x_axis: sweep_x.axis,
        y_axis: sweep_y.axis,
        axis_x,
        axis_y,
        values,
    })
}

/// Call/put price and P&L heatmaps over spot × volatility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceMatrices {
    pub call_prices: HeatmapGrid,
    pub put_prices: HeatmapGrid,
    pub call_pnl: HeatmapGrid,
    pub put_pnl: HeatmapGrid,
}

/// Builds the four spot × volatility grids shown alongside a calculation.
///
/// The P&L grids charge the premium the base parameters price the option at,
/// and value the position at expiration with the cell's spot.
pub fn generate_price_matrices(
    base_params: &PricingParameters,
    spot_range: RangeSpec,
    vol_range: RangeSpec,
) -> Result<PriceMatrices> {
    let premiums = price(base_params)?;
    let x = AxisSweep::new(SweepAxis::Spot, spot_range);
    let y = AxisSweep::new(SweepAxis::Volatility, vol_range);

    Ok(PriceMatrices {
        call_prices: build_grid(base_params, x, y, HeatmapMetric::CallPrice)?,
        put_prices: build_grid(base_params, x, y, HeatmapMetric::PutPrice)?,
        call_pnl: build_grid(
            base_params,
            x,
            y,
            HeatmapMetric::Pnl {
                option_type: OptionType::Call,
                premium_paid: premiums.call_price,
            },
        )?,
        put_pnl: build_grid(
            base_params,
            x,
            y,
            HeatmapMetric::Pnl {
                option_type: OptionType::Put,
                premium_paid: premiums.put_price,
            },
        )?,
    })
}
