//! Descriptive statistics over fitness values.
//!
//! `FitnessStats` accumulates in one pass (Welford's update), so a generation's
//! summary costs no extra storage. `SharedFitnessStats` wraps it in a mutex for
//! evaluators running on several threads at once.

use std::sync::{Mutex, PoisonError};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitnessStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for FitnessStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl FitnessStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: &[f64]) -> Self {
        let mut stats = Self::new();
        for &v in values {
            stats.add_value(v);
        }
        stats
    }

    pub fn add_value(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// NaN when empty
    pub fn mean(&self) -> f64 {
        if self.count == 0 { f64::NAN } else { self.mean }
    }

    /// bias-corrected sample variance; 0 for a single value, NaN when empty
    pub fn variance(&self) -> f64 {
        match self.count {
            0 => f64::NAN,
            1 => 0.0,
            n => self.m2 / (n - 1) as f64,
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// NaN when empty
    pub fn min(&self) -> f64 {
        if self.count == 0 { f64::NAN } else { self.min }
    }

    /// NaN when empty
    pub fn max(&self) -> f64 {
        if self.count == 0 { f64::NAN } else { self.max }
    }
}

/// thread-safe accumulator; every call takes the lock
#[derive(Debug, Default)]
pub struct SharedFitnessStats {
    inner: Mutex<FitnessStats>,
}

impl SharedFitnessStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_value(&self, value: f64) {
        // stats stay usable even if another recorder panicked mid-update
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).add_value(value);
    }

    pub fn snapshot(&self) -> FitnessStats {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn clear(&self) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = FitnessStats::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_empty_stats() {
        let s = FitnessStats::new();
        assert_eq!(s.count(), 0);
        assert!(s.mean().is_nan());
        assert!(s.min().is_nan());
        assert!(s.variance().is_nan());
    }

    #[test]
    fn test_known_values() {
        let s = FitnessStats::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(s.count(), 8);
        assert!((s.mean() - 5.0).abs() < 1e-12);
        assert!((s.variance() - 32.0 / 7.0).abs() < 1e-12);
        assert_eq!(s.min(), 2.0);
        assert_eq!(s.max(), 9.0);
    }

    #[test]
    fn test_single_value_has_zero_variance() {
        let s = FitnessStats::from_values(&[0.75]);
        assert_eq!(s.variance(), 0.0);
        assert_eq!(s.std_dev(), 0.0);
    }

    #[test]
    fn test_shared_accumulates_across_threads() {
        let shared = SharedFitnessStats::new();
        (0..1_000).into_par_iter().for_each(|i| shared.add_value(i as f64));
        let s = shared.snapshot();
        assert_eq!(s.count(), 1_000);
        assert!((s.mean() - 499.5).abs() < 1e-9);
        assert_eq!(s.max(), 999.0);

        shared.clear();
        assert_eq!(shared.snapshot().count(), 0);
    }
}
