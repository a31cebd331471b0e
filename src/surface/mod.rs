//! Implied volatility surfaces across strikes and maturities.
//!
//! Surfaces come from two places:
//!
//! - [`build_theoretical_surface`]: price every (strike, maturity) node with a
//!   known volatility function and optionally recover the volatility through
//!   the solver, validating that pricing and inversion agree.
//! - [`build_surface_from_quotes`]: invert observed market prices, one solver
//!   call per quote. Quotes the solver cannot invert stay on the surface with
//!   `implied_vol = None` so renderers can flag the gaps.
//!
//! A surface is a list of points; [`VolatilitySurface::to_mesh`] lays points
//! that already sit on a strike × maturity grid into a matrix, and
//! [`VolatilitySurface::regrid`] interpolates scattered points onto any mesh.

pub mod builder;
pub mod interp;
pub mod io;

pub use builder::{
    build_surface_from_quotes, build_theoretical_surface, quotes_from_price_matrix,
    theoretical_surface_from_config, UnderlyingParameters,
};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::config::RegridConfig;
use crate::error::Result;
use crate::types::OptionType;

/// Maturities or strikes closer than this are the same node.
pub(crate) const NODE_EPSILON: f64 = 1e-8;

/// An observed option price at one node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub strike: f64,
    /// Time to maturity in years
    pub maturity: f64,
    pub market_price: f64,
}

/// A node of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolatilityPoint {
    pub strike: f64,
    pub time_to_maturity: f64,
    pub market_price: f64,
    /// `None` when the solver did not converge for this node
    pub implied_vol: Option<f64>,
    /// Volatility the node was priced with, for theoretical surfaces
    #[serde(default)]
    pub reference_vol: Option<f64>,
}

impl ImpliedVolatilityPoint {
    /// `|implied − reference|` when both are known.
    pub fn round_trip_error(&self) -> Option<f64> {
        Some((self.implied_vol? - self.reference_vol?).abs())
    }
}

/// Implied volatility points for one underlying and option type, ordered by
/// maturity and then strike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilitySurface {
    pub spot_price: f64,
    pub risk_free_rate: f64,
    pub option_type: OptionType,
    pub points: Vec<ImpliedVolatilityPoint>,
}

/// Implied volatility on a regular strike × maturity mesh.
///
/// `values[i][j]` belongs to `maturities[i]` and `strikes[j]`; NaN marks a node
/// with no converged volatility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMesh {
    pub strikes: Vec<f64>,
    pub maturities: Vec<f64>,
    pub values: Vec<Vec<f64>>,
}

impl SurfaceMesh {
    pub fn shape(&self) -> (usize, usize) {
        (self.maturities.len(), self.strikes.len())
    }

    pub fn value(&self, maturity_index: usize, strike_index: usize) -> Option<f64> {
        self.values.get(maturity_index)?.get(strike_index).copied()
    }

    /// Number of NaN nodes.
    pub fn gap_count(&self) -> usize {
        self.values.iter().flatten().filter(|v| v.is_nan()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.gap_count() == 0
    }
}

fn by_node(a: &ImpliedVolatilityPoint, b: &ImpliedVolatilityPoint) -> Ordering {
    a.time_to_maturity
        .total_cmp(&b.time_to_maturity)
        .then(a.strike.total_cmp(&b.strike))
}

/// Sorted values with near-duplicates collapsed.
fn unique_sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values.dedup_by(|a, b| (*a - *b).abs() < NODE_EPSILON);
    values
}

fn position(axis: &[f64], value: f64) -> Option<usize> {
    axis.iter().position(|&v| (v - value).abs() < NODE_EPSILON)
}

impl VolatilitySurface {
    pub fn new(
        spot_price: f64,
        risk_free_rate: f64,
        option_type: OptionType,
        mut points: Vec<ImpliedVolatilityPoint>,
    ) -> Self {
        points.sort_by(by_node);
        Self {
            spot_price,
            risk_free_rate,
            option_type,
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn converged_count(&self) -> usize {
        self.points.iter().filter(|p| p.implied_vol.is_some()).count()
    }

    /// Points whose implied volatility could not be recovered.
    pub fn gaps(&self) -> impl Iterator<Item = &ImpliedVolatilityPoint> {
        self.points.iter().filter(|p| p.implied_vol.is_none())
    }

    pub fn strikes(&self) -> Vec<f64> {
        unique_sorted(self.points.iter().map(|p| p.strike).collect())
    }

    pub fn maturities(&self) -> Vec<f64> {
        unique_sorted(self.points.iter().map(|p| p.time_to_maturity).collect())
    }

    /// Largest round-trip error over points that carry a reference volatility.
    pub fn max_round_trip_error(&self) -> Option<f64> {
        self.points
            .iter()
            .filter_map(ImpliedVolatilityPoint::round_trip_error)
            .reduce(f64::max)
    }

    /// Lays the points out on the mesh spanned by their own strikes and
    /// maturities. Nodes without a converged point are NaN.
    pub fn to_mesh(&self) -> SurfaceMesh {
        let strikes = self.strikes();
        let maturities = self.maturities();
        let mut values = vec![vec![f64::NAN; strikes.len()]; maturities.len()];

        for point in &self.points {
            let (Some(i), Some(j), Some(vol)) = (
                position(&maturities, point.time_to_maturity),
                position(&strikes, point.strike),
                point.implied_vol,
            ) else {
                continue;
            };
            values[i][j] = vol;
        }

        SurfaceMesh {
            strikes,
            maturities,
            values,
        }
    }

    /// Interpolates converged points onto the given mesh; see
    /// [`interp::regrid`].
    pub fn regrid(
        &self,
        strikes: &[f64],
        maturities: &[f64],
        config: &RegridConfig,
    ) -> Result<SurfaceMesh> {
        interp::regrid(self, strikes, maturities, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(strike: f64, t: f64, vol: Option<f64>) -> ImpliedVolatilityPoint {
        ImpliedVolatilityPoint {
            strike,
            time_to_maturity: t,
            market_price: 1.0,
            implied_vol: vol,
            reference_vol: None,
        }
    }

    #[test]
    fn test_points_sorted_by_maturity_then_strike() {
        let surface = VolatilitySurface::new(
            100.0,
            0.05,
            OptionType::Call,
            vec![
                point(110.0, 1.0, Some(0.2)),
                point(90.0, 0.5, Some(0.25)),
                point(90.0, 1.0, Some(0.22)),
                point(110.0, 0.5, None),
            ],
        );
        let order: Vec<(f64, f64)> = surface
            .points
            .iter()
            .map(|p| (p.time_to_maturity, p.strike))
            .collect();
        assert_eq!(order, vec![(0.5, 90.0), (0.5, 110.0), (1.0, 90.0), (1.0, 110.0)]);
        assert_eq!(surface.converged_count(), 3);
        assert_eq!(surface.gaps().count(), 1);
    }

    #[test]
    fn test_mesh_marks_gaps_with_nan() {
        let surface = VolatilitySurface::new(
            100.0,
            0.05,
            OptionType::Call,
            vec![
                point(90.0, 0.5, Some(0.25)),
                point(110.0, 0.5, None),
                point(90.0, 1.0, Some(0.22)),
                point(110.0, 1.0, Some(0.2)),
            ],
        );
        let mesh = surface.to_mesh();
        assert_eq!(mesh.shape(), (2, 2));
        assert_eq!(mesh.strikes, vec![90.0, 110.0]);
        assert_eq!(mesh.maturities, vec![0.5, 1.0]);
        assert_eq!(mesh.value(0, 0), Some(0.25));
        assert!(mesh.value(0, 1).unwrap().is_nan());
        assert_eq!(mesh.gap_count(), 1);
        assert!(!mesh.is_complete());
    }

    #[test]
    fn test_round_trip_error() {
        let mut p = point(100.0, 1.0, Some(0.2000001));
        assert_eq!(p.round_trip_error(), None);
        p.reference_vol = Some(0.2);
        assert!((p.round_trip_error().unwrap() - 1e-7).abs() < 1e-12);
    }
}
