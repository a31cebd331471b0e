//! # BSM-Lib: Black-Scholes Pricing, Implied Volatility and Surface Construction
//!
//! `bsm-lib` is the computational core of an interactive option pricing tool. It prices
//! European options under Black-Scholes, evaluates P&L at expiration, recovers implied
//! volatility from observed prices, and builds the grids a front end renders as heatmaps
//! and 3D volatility surfaces.
//!
//! ## Core Features
//!
//! - **Pricing**: closed-form call and put prices with well-defined limits at `T = 0` and `σ = 0`
//! - **Greeks**: delta, gamma, vega, theta and rho
//! - **Implied Volatility**: hybrid Newton-Raphson / bisection solver on a bounded volatility
//!   bracket, with bisection-only and Brent alternatives
//! - **Heatmaps**: any pricing metric over any two swept inputs
//! - **Surfaces**: theoretical smile surfaces and surfaces inverted from market quotes, with
//!   CSV import/export and re-gridding in total variance
//!
//! ## Quick Start
//!
//! ```rust
//! use bsm_lib::{implied_volatility, price, MarketParameters, OptionType, PricingParameters};
//!
//! let params = PricingParameters::new(100.0, 100.0, 1.0, 0.2, 0.05)?;
//! let result = price(&params)?;
//! assert!((result.call_price - 10.450583572).abs() < 1e-6);
//!
//! let market = MarketParameters::new(100.0, 100.0, 1.0, 0.05)?;
//! let sigma = implied_volatility(result.call_price, &market, OptionType::Call, 1e-8, 100)?;
//! assert!((sigma - 0.2).abs() < 1e-6);
//! # Ok::<(), bsm_lib::PricingError>(())
//! ```
//!
//! ## Errors
//!
//! Every operation validates its inputs and fails with [`PricingError::InvalidParameter`]
//! on out-of-domain values. The implied volatility solver reports prices it cannot invert
//! as [`PricingError::NotConverged`]; surface builders keep such nodes with
//! `implied_vol = None` instead of failing.
//!
//! ## Configuration Presets
//!
//! The solver ships with several presets, see [`default_configs`]:
//! - `production()`: tight tolerance for live pricing
//! - `fast()`: default settings
//! - `research()`: very tight tolerance and a wider bracket
//! - `minimal()`: loose bisection for quick checks
//!
//! ## Features
//!
//! - `parallel`: evaluate heatmap rows and surface nodes on the rayon thread pool

// ================================================================================================
// MODULES
// ================================================================================================

pub mod config;
pub mod error;
pub mod grid;
pub mod implied_vol;
pub mod models;
pub mod pnl;
pub mod surface;
pub mod types;

// ================================================================================================
// PUBLIC RE-EXPORTS
// ================================================================================================

// Core types and errors
pub use error::{NonConvergence, PricingError, Result};
pub use types::{MarketParameters, OptionType, PnLPoint, PricingParameters, PricingResult};

// Pricing
pub use models::bs::{d1_d2, greeks, price, price_option, vega, Greeks};
pub use pnl::{breakeven, profit_loss};

// Implied volatility
pub use implied_vol::{implied_volatility, implied_volatility_with, solve, SolverOutcome};

// Heatmaps
pub use grid::{
    build_grid, generate_price_matrices, AxisSweep, HeatmapGrid, HeatmapMetric, PriceMatrices,
    RangeSpec, SweepAxis,
};

// Surfaces
pub use models::smile::{ConstantVolatility, SmileVolatility, SviParams, SviSmile};
pub use models::traits::VolatilityFunction;
pub use surface::{
    build_surface_from_quotes, build_theoretical_surface, quotes_from_price_matrix,
    theoretical_surface_from_config, ImpliedVolatilityPoint, MarketQuote, SurfaceMesh,
    UnderlyingParameters, VolatilitySurface,
};

// Configuration
pub use config::{
    EngineConfig, HeatmapConfig, RegridConfig, SolverConfig, SolverMethod, SurfaceConfig,
    TimeInterpolation,
};

// ================================================================================================
// DEFAULT CONFIGURATIONS
// ================================================================================================

/// Pre-configured implied volatility solver settings.
///
/// # Available Configurations
///
/// - [`production()`]: tight tolerance for live pricing
/// - [`fast()`]: default settings
/// - [`research()`]: high precision with a wider bracket
/// - [`minimal()`]: quick validation settings
pub mod default_configs {
    use crate::config::SolverConfig;

    /// Production-grade solver settings.
    ///
    /// **Characteristics:**
    /// - Hybrid Newton-Raphson / bisection
    /// - Price tolerance: 1e-10
    /// - Maximum iterations: 100
    /// - Volatility bracket: `[1e-6, 5.0]`
    ///
    /// # Example
    ///
    /// ```rust
    /// use bsm_lib::default_configs;
    ///
    /// let config = default_configs::production();
    /// assert_eq!(config.tolerance, 1e-10);
    /// ```
    pub fn production() -> SolverConfig {
        SolverConfig::production()
    }

    /// Default solver settings.
    ///
    /// **Characteristics:**
    /// - Hybrid Newton-Raphson / bisection
    /// - Price tolerance: 1e-8
    /// - Maximum iterations: 100
    pub fn fast() -> SolverConfig {
        SolverConfig::fast()
    }

    /// High-precision settings for research and model validation.
    ///
    /// **Characteristics:**
    /// - Price tolerance: 1e-12
    /// - Maximum iterations: 500
    /// - Volatility bracket: `[1e-8, 10.0]`
    pub fn research() -> SolverConfig {
        SolverConfig::research()
    }

    /// Minimal configuration for quick checks.
    ///
    /// **Characteristics:**
    /// - Plain bisection
    /// - Price tolerance: 1e-4
    /// - Maximum iterations: 50
    ///
    /// # Example
    ///
    /// ```rust
    /// use bsm_lib::{default_configs, SolverMethod};
    ///
    /// let config = default_configs::minimal();
    /// assert_eq!(config.method, SolverMethod::Bisection);
    /// ```
    pub fn minimal() -> SolverConfig {
        SolverConfig::minimal()
    }
}
