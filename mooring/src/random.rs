//! Random number generation provider abstraction.
//!
//! Signaling identities must be unpredictable across attempts. Implementations
//! supply real entropy in production and seeded determinism in tests.

use rand::distr::{Distribution, StandardUniform};
use rand::prelude::*;
use std::cell::RefCell;

/// Provider trait for random number generation.
pub trait RandomProvider: Clone {
    /// Generate a random value of type T.
    fn random<T>(&self) -> T
    where
        StandardUniform: Distribution<T>;
}

/// Production random provider using a thread-local RNG.
///
/// Uses `rand::rng()` (thread-local, non-cryptographic), which is sufficient
/// for identity tokens whose only requirement is collision avoidance.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioRandomProvider;

impl TokioRandomProvider {
    /// Create a new production random provider.
    pub fn new() -> Self {
        Self
    }
}

thread_local! {
    static RNG: RefCell<rand::rngs::ThreadRng> = RefCell::new(rand::rng());
}

impl RandomProvider for TokioRandomProvider {
    fn random<T>(&self) -> T
    where
        StandardUniform: Distribution<T>,
    {
        RNG.with(|rng| rng.borrow_mut().random())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_provider_yields_distinct_values() {
        let random = TokioRandomProvider::new();
        let a: u64 = random.random();
        let b: u64 = random.random();
        let c: u64 = random.random();

        // Three identical draws from a 64-bit space means a broken source.
        assert!(!(a == b && b == c));
    }
}
