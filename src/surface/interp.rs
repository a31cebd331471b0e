//! Re-gridding of scattered surface points.
//!
//! Each maturity slice is interpolated linearly in total variance
//! `w = σ²T` along log-moneyness `k = ln(K/S)`; slices are then combined
//! across maturities according to [`TimeInterpolation`]. Without extrapolation
//! any mesh node outside the observed strikes or maturities is NaN, as is any
//! node where the interpolated variance is not positive.

use log::debug;

use super::builder::check_axis;
use super::{SurfaceMesh, VolatilitySurface, NODE_EPSILON};
use crate::config::{RegridConfig, TimeInterpolation};
use crate::error::Result;
use crate::models::utils::log_moneyness;

/// One maturity: sorted `(log_moneyness, total_variance)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct VarianceSlice {
    pub maturity: f64,
    pub points: Vec<(f64, f64)>,
}

/// Groups converged points into maturity slices, ascending in maturity.
///
/// Points at `T = 0` carry no variance information and are dropped. Strikes
/// that coincide within a slice are averaged in variance. The order of
/// `surface.points` does not matter.
pub fn variance_slices(surface: &VolatilitySurface) -> Vec<VarianceSlice> {
    let mut nodes: Vec<(f64, f64, f64)> = surface
        .points
        .iter()
        .filter(|point| point.time_to_maturity > 0.0)
        .filter_map(|point| {
            let vol = point.implied_vol?;
            let t = point.time_to_maturity;
            Some((t, log_moneyness(point.strike, surface.spot_price), vol * vol * t))
        })
        .collect();
    nodes.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let mut slices: Vec<VarianceSlice> = Vec::new();
    for (t, k, w) in nodes {
        match slices.last_mut() {
            Some(slice) if (slice.maturity - t).abs() < NODE_EPSILON => slice.points.push((k, w)),
            _ => slices.push(VarianceSlice {
                maturity: t,
                points: vec![(k, w)],
            }),
        }
    }

    for slice in &mut slices {
        slice.points = average_duplicates(&slice.points);
    }
    slices
}

fn average_duplicates(sorted: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut merged: Vec<(f64, f64, usize)> = Vec::with_capacity(sorted.len());
    for &(x, y) in sorted {
        match merged.last_mut() {
            Some((mx, sum, n)) if (x - *mx).abs() < NODE_EPSILON => {
                *sum += y;
                *n += 1;
            }
            _ => merged.push((x, y, 1)),
        }
    }
    merged
        .into_iter()
        .map(|(x, sum, n)| (x, sum / n as f64))
        .collect()
}

/// Piecewise-linear interpolation on `(x, y)` pairs sorted by `x`.
///
/// Outside the data the nearest two points are extended linearly when
/// `allow_extrapolation` is set; a single point extends flat. Returns `None`
/// when the query needs extrapolation that is disabled.
pub fn linear_interp(sorted_points: &[(f64, f64)], query_x: f64, allow_extrapolation: bool) -> Option<f64> {
    let (&(first_x, first_y), &(last_x, last_y)) = (sorted_points.first()?, sorted_points.last()?);

    if query_x < first_x - NODE_EPSILON || query_x > last_x + NODE_EPSILON {
        if !allow_extrapolation {
            return None;
        }
        if sorted_points.len() == 1 {
            return Some(first_y);
        }
        let n = sorted_points.len();
        let ((x1, y1), (x2, y2)) = if query_x < first_x {
            (sorted_points[0], sorted_points[1])
        } else {
            (sorted_points[n - 2], sorted_points[n - 1])
        };
        return Some(y1 + (y2 - y1) / (x2 - x1) * (query_x - x1));
    }

    if query_x <= first_x {
        return Some(first_y);
    }
    if query_x >= last_x {
        return Some(last_y);
    }

    // partition_point: first index with x > query_x, guaranteed in 1..n
    let upper = sorted_points.partition_point(|&(x, _)| x <= query_x);
    let (x1, y1) = sorted_points[upper - 1];
    let (x2, y2) = sorted_points[upper];
    Some(y1 + (query_x - x1) / (x2 - x1) * (y2 - y1))
}

/// Implied volatility at `(k, t)`, or NaN where it cannot be determined.
fn volatility_at(slices: &[VarianceSlice], k: f64, t: f64, config: &RegridConfig) -> f64 {
    if t <= 0.0 {
        return f64::NAN;
    }
    let extrapolate = config.allow_extrapolation;

    // Per-slice value at k, in the space the time interpolation works in
    let term: Vec<(f64, f64)> = slices
        .iter()
        .filter_map(|slice| {
            let w = linear_interp(&slice.points, k, extrapolate).filter(|w| *w > 0.0)?;
            Some(match config.time_interpolation {
                TimeInterpolation::LinearVariance => (slice.maturity, w),
                TimeInterpolation::LinearVolatility => (slice.maturity, (w / slice.maturity).sqrt()),
            })
        })
        .collect();

    let value = match term.as_slice() {
        [] => None,
        // A lone slice only extends by holding its volatility flat
        [(t0, v0)] => {
            if (t - t0).abs() >= NODE_EPSILON && !extrapolate {
                None
            } else {
                Some(match config.time_interpolation {
                    TimeInterpolation::LinearVariance => v0 * t / t0,
                    TimeInterpolation::LinearVolatility => *v0,
                })
            }
        }
        _ => linear_interp(&term, t, extrapolate),
    };

    match (value, config.time_interpolation) {
        (Some(w), TimeInterpolation::LinearVariance) if w > 0.0 => (w / t).sqrt(),
        (Some(v), TimeInterpolation::LinearVolatility) if v > 0.0 => v,
        _ => f64::NAN,
    }
}

/// Interpolates the converged points of `surface` onto the mesh spanned by
/// `strikes` and `maturities`.
///
/// Both axes must be strictly increasing, with positive strikes and
/// non-negative maturities. Gap points on the surface are ignored.
pub fn regrid(
    surface: &VolatilitySurface,
    strikes: &[f64],
    maturities: &[f64],
    config: &RegridConfig,
) -> Result<SurfaceMesh> {
    check_axis("strikes", strikes, true)?;
    check_axis("maturities", maturities, false)?;

    let slices = variance_slices(surface);
    debug!(
        "regridding {} slices onto {}x{} mesh ({:?})",
        slices.len(),
        maturities.len(),
        strikes.len(),
        config.time_interpolation
    );

    let log_strikes: Vec<f64> = strikes
        .iter()
        .map(|&strike| log_moneyness(strike, surface.spot_price))
        .collect();
    let values = maturities
        .iter()
        .map(|&t| {
            log_strikes
                .iter()
                .map(|&k| volatility_at(&slices, k, t, config))
                .collect()
        })
        .collect();

    Ok(SurfaceMesh {
        strikes: strikes.to_vec(),
        maturities: maturities.to_vec(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ImpliedVolatilityPoint;
    use crate::types::OptionType;

    fn surface(nodes: &[(f64, f64, Option<f64>)]) -> VolatilitySurface {
        let points = nodes
            .iter()
            .map(|&(strike, t, vol)| ImpliedVolatilityPoint {
                strike,
                time_to_maturity: t,
                market_price: 1.0,
                implied_vol: vol,
                reference_vol: None,
            })
            .collect();
        VolatilitySurface::new(100.0, 0.0, OptionType::Call, points)
    }

    fn flat(vol: f64) -> VolatilitySurface {
        let mut nodes = Vec::new();
        for t in [0.5, 1.0, 2.0] {
            for k in [80.0, 100.0, 120.0] {
                nodes.push((k, t, Some(vol)));
            }
        }
        surface(&nodes)
    }

    #[test]
    fn test_linear_interp() {
        let pts = [(0.0, 1.0), (1.0, 3.0), (2.0, 4.0)];
        assert_eq!(linear_interp(&pts, 0.5, false), Some(2.0));
        assert_eq!(linear_interp(&pts, 2.0, false), Some(4.0));
        assert_eq!(linear_interp(&pts, 3.0, false), None);
        assert_eq!(linear_interp(&pts, 3.0, true), Some(5.0));
        assert_eq!(linear_interp(&pts, -1.0, true), Some(-1.0));
        assert_eq!(linear_interp(&[], 0.0, true), None);
    }

    #[test]
    fn test_flat_surface_stays_flat() {
        for time_interpolation in [TimeInterpolation::LinearVariance, TimeInterpolation::LinearVolatility] {
            let config = RegridConfig {
                allow_extrapolation: false,
                time_interpolation,
            };
            let mesh = flat(0.25)
                .regrid(&[90.0, 100.0, 110.0], &[0.75, 1.5], &config)
                .unwrap();
            assert!(mesh.is_complete());
            for v in mesh.values.iter().flatten() {
                assert!((v - 0.25).abs() < 1e-12, "{time_interpolation:?}: {v}");
            }
        }
    }

    #[test]
    fn test_outside_data_is_nan_without_extrapolation() {
        let mesh = flat(0.25)
            .regrid(&[60.0, 100.0], &[0.25, 1.0, 3.0], &RegridConfig::default())
            .unwrap();
        assert!(mesh.value(0, 1).unwrap().is_nan()); // T below the data
        assert!(mesh.value(1, 0).unwrap().is_nan()); // K below the data
        assert!(mesh.value(2, 1).unwrap().is_nan()); // T above the data
        assert!((mesh.value(1, 1).unwrap() - 0.25).abs() < 1e-12);

        let config = RegridConfig {
            allow_extrapolation: true,
            ..RegridConfig::default()
        };
        let mesh = flat(0.25)
            .regrid(&[60.0, 100.0], &[0.25, 1.0, 3.0], &config)
            .unwrap();
        assert!(mesh.is_complete());
        for v in mesh.values.iter().flatten() {
            assert!((v - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn test_time_interpolation_methods_differ() {
        let s = surface(&[(100.0, 1.0, Some(0.2)), (100.0, 2.0, Some(0.3))]);

        let by_vol = RegridConfig {
            allow_extrapolation: false,
            time_interpolation: TimeInterpolation::LinearVolatility,
        };
        let mesh = s.regrid(&[100.0], &[1.5], &by_vol).unwrap();
        assert!((mesh.values[0][0] - 0.25).abs() < 1e-12);

        let mesh = s.regrid(&[100.0], &[1.5], &RegridConfig::default()).unwrap();
        // w(1.5) = (0.04 + 0.18) / 2
        let expected = (0.11_f64 / 1.5).sqrt();
        assert!((mesh.values[0][0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_gaps_and_expired_points_ignored() {
        let s = surface(&[
            (90.0, 0.0, Some(0.5)),
            (90.0, 1.0, Some(0.2)),
            (110.0, 1.0, None),
            (130.0, 1.0, Some(0.4)),
        ]);
        let slices = variance_slices(&s);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].points.len(), 2);

        let mesh = s.regrid(&[110.0], &[1.0], &RegridConfig::default()).unwrap();
        assert!(mesh.values[0][0] > 0.2 && mesh.values[0][0] < 0.4);
    }

    #[test]
    fn test_invalid_mesh_rejected() {
        let s = flat(0.2);
        assert!(s.regrid(&[100.0, 90.0], &[1.0], &RegridConfig::default()).is_err());
        assert!(s.regrid(&[100.0], &[-1.0], &RegridConfig::default()).is_err());
        assert!(s.regrid(&[0.0], &[1.0], &RegridConfig::default()).is_err());
    }

    #[test]
    fn test_unsorted_points_regrid_like_sorted() {
        let nodes = [
            (120.0, 1.0, Some(0.3)),
            (80.0, 1.0, Some(0.2)),
            (100.0, 1.0, Some(0.25)),
            (100.0, 0.5, Some(0.22)),
        ];
        let sorted = surface(&nodes);
        // Built directly, as a deserialized surface would be
        let unsorted = VolatilitySurface {
            points: nodes
                .iter()
                .map(|&(strike, t, vol)| ImpliedVolatilityPoint {
                    strike,
                    time_to_maturity: t,
                    market_price: 1.0,
                    implied_vol: vol,
                    reference_vol: None,
                })
                .collect(),
            ..sorted.clone()
        };
        assert_ne!(unsorted.points, sorted.points);

        let slices = variance_slices(&unsorted);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].maturity, 0.5);
        assert!(slices[1].points.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(slices, variance_slices(&sorted));

        let mesh = unsorted
            .regrid(&[90.0, 110.0], &[1.0], &RegridConfig::default())
            .unwrap();
        assert!(mesh.is_complete());
        assert!(mesh.values[0][0] > 0.2 && mesh.values[0][0] < 0.25);
        assert!(mesh.values[0][1] > 0.25 && mesh.values[0][1] < 0.3);
        assert_eq!(
            mesh,
            sorted.regrid(&[90.0, 110.0], &[1.0], &RegridConfig::default()).unwrap()
        );
    }
}
