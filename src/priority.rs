//! Priority sources for [`Treap`](crate::Treap).

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Supplies the random heap priority of every key inserted into a treap.
///
/// Priorities are drawn from `[0, 1)`. Any `FnMut() -> f64` closure is a source, which is
/// how tests pin the tree's shape.
///
/// # Examples
///
/// ```
/// use ordered_index::{OrderedIndex, Treap};
///
/// let mut scripted = [0.9, 0.1, 0.5].into_iter();
/// let mut treap = Treap::with_priorities(move || scripted.next().unwrap_or(0.0));
/// treap.insert(2, ());
/// treap.insert(1, ());
/// treap.insert(3, ());
/// treap.validate();
/// ```
pub trait PrioritySource {
    /// Returns the priority of the next inserted key.
    fn next_priority(&mut self) -> f64;
}

impl<F: FnMut() -> f64> PrioritySource for F {
    fn next_priority(&mut self) -> f64 {
        self()
    }
}

/// Seed used by [`SeededPriorities::default`].
pub const DEFAULT_TREAP_SEED: u64 = 0x5EED_7EA9;

/// Reproducible pseudo-random priorities from a small, fast generator.
#[derive(Clone, Debug)]
pub struct SeededPriorities {
    rng: SmallRng,
}

impl SeededPriorities {
    /// Creates a source whose sequence is fully determined by `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Default for SeededPriorities {
    fn default() -> Self {
        Self::new(DEFAULT_TREAP_SEED)
    }
}

impl PrioritySource for SeededPriorities {
    fn next_priority(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SeededPriorities::new(7);
        let mut b = SeededPriorities::new(7);
        let left: Vec<f64> = (0..32).map(|_| a.next_priority()).collect();
        let right: Vec<f64> = (0..32).map(|_| b.next_priority()).collect();
        assert_eq!(left, right);
        assert!(left.iter().all(|p| (0.0..1.0).contains(p)));
    }

    #[test]
    fn closures_are_sources() {
        let mut counter = 0.0;
        let mut source = move || {
            counter += 0.25;
            counter
        };
        assert_eq!(source.next_priority(), 0.25);
        assert_eq!(source.next_priority(), 0.5);
    }
}
