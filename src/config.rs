//! Engine configuration.
//!
//! Every section deserialises from TOML with per-field defaults, so a config
//! file only needs the values it wants to change:
//!
//! ```toml
//! [solver]
//! tolerance = 1e-10
//! method = "brent"
//!
//! [heatmap]
//! spot_steps = 15
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ensure_param;
use crate::error::Result as PricingResult;
use crate::grid::RangeSpec;

/// Root-finding strategy for implied volatility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverMethod {
    /// Newton-Raphson on vega, falling back to bisection whenever a step
    /// would leave the current bracket
    #[default]
    Hybrid,
    /// Plain bisection on the volatility bracket
    Bisection,
    /// Brent's method on the volatility bracket
    Brent,
}

/// Implied volatility solver settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Absolute price tolerance
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Iteration cap; the solver reports non-convergence once it is reached
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Lower end of the volatility bracket
    #[serde(default = "default_min_volatility")]
    pub min_volatility: f64,

    /// Upper end of the volatility bracket (σ_max)
    #[serde(default = "default_max_volatility")]
    pub max_volatility: f64,

    #[serde(default)]
    pub method: SolverMethod,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
            min_volatility: default_min_volatility(),
            max_volatility: default_max_volatility(),
            method: SolverMethod::default(),
        }
    }
}

impl SolverConfig {
    /// Tight tolerance with the hybrid solver, suitable for live pricing
    pub fn production() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 100,
            ..Self::default()
        }
    }

    /// Default settings
    pub fn fast() -> Self {
        Self::default()
    }

    /// Very tight tolerance, generous iteration budget and a wider bracket
    pub fn research() -> Self {
        Self {
            tolerance: 1e-12,
            max_iterations: 500,
            min_volatility: 1e-8,
            max_volatility: 10.0,
            method: SolverMethod::Hybrid,
        }
    }

    /// Loose bisection for quick checks
    pub fn minimal() -> Self {
        Self {
            tolerance: 1e-4,
            max_iterations: 50,
            method: SolverMethod::Bisection,
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: SolverMethod) -> Self {
        self.method = method;
        self
    }

    pub fn validate(&self) -> PricingResult<()> {
        ensure_param!(
            self.tolerance.is_finite() && self.tolerance > 0.0,
            "tolerance",
            self.tolerance,
            "must be > 0 and finite"
        );
        ensure_param!(
            self.max_iterations >= 1,
            "max_iterations",
            self.max_iterations,
            "must be >= 1"
        );
        ensure_param!(
            self.min_volatility.is_finite() && self.min_volatility > 0.0,
            "min_volatility",
            self.min_volatility,
            "must be > 0 and finite"
        );
        ensure_param!(
            self.max_volatility.is_finite() && self.max_volatility > self.min_volatility,
            "max_volatility",
            self.max_volatility,
            "must be finite and greater than min_volatility ({})",
            self.min_volatility
        );
        Ok(())
    }
}

/// Defaults for spot × volatility heatmaps around a base calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapConfig {
    /// Spot axis spans `spot · (1 ± spot_range_fraction)`
    #[serde(default = "default_spot_range_fraction")]
    pub spot_range_fraction: f64,

    #[serde(default = "default_heatmap_min_vol")]
    pub min_volatility: f64,

    #[serde(default = "default_heatmap_max_vol")]
    pub max_volatility: f64,

    #[serde(default = "default_heatmap_steps")]
    pub spot_steps: usize,

    #[serde(default = "default_heatmap_steps")]
    pub vol_steps: usize,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            spot_range_fraction: default_spot_range_fraction(),
            min_volatility: default_heatmap_min_vol(),
            max_volatility: default_heatmap_max_vol(),
            spot_steps: default_heatmap_steps(),
            vol_steps: default_heatmap_steps(),
        }
    }
}

impl HeatmapConfig {
    /// Spot axis centred on `spot`.
    pub fn spot_range(&self, spot: f64) -> PricingResult<RangeSpec> {
        ensure_param!(
            self.spot_range_fraction.is_finite()
                && self.spot_range_fraction > 0.0
                && self.spot_range_fraction < 1.0,
            "spot_range_fraction",
            self.spot_range_fraction,
            "must lie in (0, 1)"
        );
        RangeSpec::new(
            spot * (1.0 - self.spot_range_fraction),
            spot * (1.0 + self.spot_range_fraction),
            self.spot_steps,
        )
    }

    pub fn vol_range(&self) -> PricingResult<RangeSpec> {
        RangeSpec::new(self.min_volatility, self.max_volatility, self.vol_steps)
    }
}

/// How re-gridding moves between maturity slices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeInterpolation {
    /// Interpolate implied volatility directly in T
    LinearVolatility,
    /// Interpolate total variance w = σ²T, then convert back
    #[default]
    LinearVariance,
}

/// Settings for re-gridding scattered surface points onto a mesh
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegridConfig {
    /// Extend linearly past the outermost observed strikes and maturities
    #[serde(default)]
    pub allow_extrapolation: bool,

    #[serde(default)]
    pub time_interpolation: TimeInterpolation,
}

/// Theoretical surface defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    #[serde(default = "default_base_volatility")]
    pub base_volatility: f64,

    #[serde(default = "default_smile_factor")]
    pub smile_factor: f64,

    #[serde(default = "default_term_structure_factor")]
    pub term_structure_factor: f64,

    #[serde(default = "default_strike_steps")]
    pub strike_steps: usize,

    #[serde(default = "default_expiry_steps")]
    pub expiry_steps: usize,

    #[serde(default = "default_min_expiry")]
    pub min_expiry: f64,

    #[serde(default = "default_max_expiry")]
    pub max_expiry: f64,

    /// Recover each theoretical volatility through the solver and keep the
    /// solver's answer
    #[serde(default = "default_round_trip_check")]
    pub round_trip_check: bool,

    #[serde(default)]
    pub regrid: RegridConfig,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            base_volatility: default_base_volatility(),
            smile_factor: default_smile_factor(),
            term_structure_factor: default_term_structure_factor(),
            strike_steps: default_strike_steps(),
            expiry_steps: default_expiry_steps(),
            min_expiry: default_min_expiry(),
            max_expiry: default_max_expiry(),
            round_trip_check: default_round_trip_check(),
            regrid: RegridConfig::default(),
        }
    }
}

impl SurfaceConfig {
    /// The configured smile as a volatility function.
    pub fn smile(&self) -> crate::models::smile::SmileVolatility {
        crate::models::smile::SmileVolatility {
            base_volatility: self.base_volatility,
            smile_factor: self.smile_factor,
            term_structure_factor: self.term_structure_factor,
        }
    }

    /// Strike axis spanning `spot · [0.5, 1.5]`.
    pub fn strike_range(&self, spot: f64) -> PricingResult<RangeSpec> {
        RangeSpec::new(0.5 * spot, 1.5 * spot, self.strike_steps)
    }

    pub fn expiry_range(&self) -> PricingResult<RangeSpec> {
        RangeSpec::new(self.min_expiry, self.max_expiry, self.expiry_steps)
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub solver: SolverConfig,

    #[serde(default)]
    pub heatmap: HeatmapConfig,

    #[serde(default)]
    pub surface: SurfaceConfig,
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).context("failed to parse engine config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&source).with_context(|| format!("in {}", path.display()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialise engine config")
    }

    pub fn validate(&self) -> PricingResult<()> {
        self.solver.validate()?;
        self.heatmap.spot_range(1.0)?;
        self.heatmap.vol_range()?;
        crate::models::traits::VolatilityFunction::validate(&self.surface.smile())?;
        self.surface.strike_range(1.0)?;
        ensure_param!(
            self.surface.min_expiry > 0.0,
            "min_expiry",
            self.surface.min_expiry,
            "must be > 0"
        );
        self.surface.expiry_range()?;
        Ok(())
    }
}

fn default_tolerance() -> f64 {
    1e-8
}

fn default_max_iterations() -> usize {
    100
}

fn default_min_volatility() -> f64 {
    1e-6
}

fn default_max_volatility() -> f64 {
    5.0
}

fn default_spot_range_fraction() -> f64 {
    0.2
}

fn default_heatmap_min_vol() -> f64 {
    0.1
}

fn default_heatmap_max_vol() -> f64 {
    0.5
}

fn default_heatmap_steps() -> usize {
    10
}

fn default_base_volatility() -> f64 {
    0.2
}

fn default_smile_factor() -> f64 {
    0.4
}

fn default_term_structure_factor() -> f64 {
    0.1
}

fn default_strike_steps() -> usize {
    20
}

fn default_expiry_steps() -> usize {
    10
}

fn default_min_expiry() -> f64 {
    0.1
}

fn default_max_expiry() -> f64 {
    2.0
}

fn default_round_trip_check() -> bool {
    true
}
