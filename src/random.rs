//! Random-number collaborator for beacon dedupe ids and visitor counters.

use std::ops::RangeInclusive;

/// Source of best-effort random numbers.
///
/// No cryptographic property is required; uniqueness across requests is
/// best-effort, not guaranteed.
pub trait RandomSource: Send + Sync {
    /// Draw a number from the inclusive range.
    fn next_in_range(&self, range: RangeInclusive<u64>) -> u64;
}

/// Production source backed by the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn next_in_range(&self, range: RangeInclusive<u64>) -> u64 {
        use rand::RngExt;
        rand::rng().random_range(range)
    }
}

/// Source that always returns the same number, ignoring the range.
#[cfg(test)]
pub(crate) struct FixedRandom(pub u64);

#[cfg(test)]
impl RandomSource for FixedRandom {
    fn next_in_range(&self, _range: RangeInclusive<u64>) -> u64 {
        self.0
    }
}
