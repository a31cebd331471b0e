use serde::{Deserialize, Serialize};

use crate::ensure_param;
use crate::error::Result;
use crate::models::utils::is_strictly_increasing;

/// Evenly spaced sweep `{min, max, steps}`, inclusive of both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeSpec {
    pub min: f64,
    pub max: f64,
    pub steps: usize,
}

impl RangeSpec {
    /// Creates a validated range: finite bounds, `max > min`, `steps >= 2`,
    /// and a step wide enough that every grid point is distinct.
    pub fn new(min: f64, max: f64, steps: usize) -> Result<Self> {
        let range = Self { min, max, steps };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_param!(self.min.is_finite(), "min", self.min, "must be finite");
        ensure_param!(
            self.max.is_finite() && self.max > self.min,
            "max",
            self.max,
            "must be finite and greater than min ({})",
            self.min
        );
        ensure_param!(self.steps >= 2, "steps", self.steps, "must be >= 2");
        ensure_param!(
            is_strictly_increasing(&self.values()),
            "steps",
            self.steps,
            "too many steps to resolve [{}, {}]",
            self.min,
            self.max
        );
        Ok(())
    }

    /// The `steps` grid points, ascending, with the last one exactly `max`.
    pub fn values(&self) -> Vec<f64> {
        let last = self.steps - 1;
        let width = self.max - self.min;
        (0..self.steps)
            .map(|i| {
                if i == last {
                    self.max
                } else {
                    self.min + width * (i as f64) / (last as f64)
                }
            })
            .collect()
    }

    pub fn step_size(&self) -> f64 {
        (self.max - self.min) / ((self.steps - 1) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inclusive_linspace() {
        let range = RangeSpec::new(80.0, 120.0, 5).unwrap();
        assert_eq!(range.values(), vec![80.0, 90.0, 100.0, 110.0, 120.0]);
        assert_eq!(range.step_size(), 10.0);
    }

    #[test]
    fn test_endpoints_exact() {
        let values = RangeSpec::new(0.1, 0.4, 7).unwrap().values();
        assert_eq!(values.len(), 7);
        assert_eq!(values[0], 0.1);
        assert_eq!(values[6], 0.4);
        assert!(values.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(RangeSpec::new(1.0, 2.0, 1).is_err());
        assert!(RangeSpec::new(1.0, 2.0, 0).is_err());
        assert!(RangeSpec::new(2.0, 1.0, 5).is_err());
        assert!(RangeSpec::new(1.0, 1.0, 5).is_err());
        assert!(RangeSpec::new(f64::NAN, 1.0, 5).is_err());
    }

    #[test]
    fn test_unresolvable_step_rejected() {
        let max = 1.0 + 4.0 * f64::EPSILON;
        let err = RangeSpec::new(1.0, max, 10).unwrap_err();
        assert!(err.is_invalid_parameter());
        assert!(RangeSpec::new(1.0, max, 5).is_ok());
        assert!(RangeSpec::new(-f64::MAX, f64::MAX, 3).is_err());
    }
}
