#![allow(dead_code)] // Each test binary uses a different subset of these helpers

use bsm_lib::{MarketParameters, PricingParameters};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Canonical at-the-money contract: S = K = 100, T = 1, σ = 20%, r = 5%.
pub fn textbook_params() -> PricingParameters {
    PricingParameters::new(100.0, 100.0, 1.0, 0.2, 0.05).expect("textbook parameters are valid")
}

pub fn textbook_market() -> MarketParameters {
    textbook_params().market()
}

/// Routes library logs to the test harness; `RUST_LOG=debug` shows solver
/// diagnostics. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .is_test(true)
        .try_init();
}

/// Deterministic generator so failures reproduce.
pub fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

/// Random but well-conditioned pricing inputs.
pub fn random_params(rng: &mut StdRng) -> PricingParameters {
    PricingParameters::new(
        rng.gen_range(20.0..200.0),
        rng.gen_range(20.0..200.0),
        rng.gen_range(0.01..3.0),
        rng.gen_range(0.01..1.5),
        rng.gen_range(-0.02..0.10),
    )
    .expect("sampled parameters are in domain")
}

/// Asserts `|actual − expected| <= tolerance` with a readable message.
pub fn assert_close(actual: f64, expected: f64, tolerance: f64, what: &str) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "{what}: expected {expected}, got {actual} (diff {:.3e})",
        (actual - expected).abs()
    );
}
