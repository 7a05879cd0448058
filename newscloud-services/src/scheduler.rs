//! Presentation Scheduler
//!
//! A shuffle bag over the current [`AggregatedSet`]: every item is served
//! exactly once per cycle, in random order, before any item repeats.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use newscloud_core::{AggregatedSet, FeedItem};

/// Non-repeating random selector over one item generation.
///
/// Single consumer: `next` and `reset` are called from the same task.
#[derive(Debug)]
pub struct ShuffleBag<R = StdRng> {
    set: AggregatedSet,
    remaining: Vec<usize>,
    rng: R,
    cycles: u64,
}

impl ShuffleBag<StdRng> {
    /// Bag seeded from the operating system
    pub fn new(set: AggregatedSet) -> Self {
        Self::with_rng(set, StdRng::from_os_rng())
    }
}

impl<R: Rng> ShuffleBag<R> {
    pub fn with_rng(set: AggregatedSet, rng: R) -> Self {
        let mut bag = Self {
            set: AggregatedSet::empty(),
            remaining: Vec::new(),
            rng,
            cycles: 0,
        };
        bag.reset(set);
        bag
    }

    /// Swap in a new generation and refill immediately.
    ///
    /// Any partially drawn cycle of the previous generation is discarded.
    pub fn reset(&mut self, set: AggregatedSet) {
        self.set = set;
        self.refill();
        self.cycles = 0;
    }

    /// Draw the next item, or `None` when the set is empty
    pub fn draw(&mut self) -> Option<&FeedItem> {
        if self.set.is_empty() {
            return None;
        }

        if self.remaining.is_empty() {
            self.refill();
            self.cycles += 1;
            debug!("Shuffle bag exhausted, starting cycle {}", self.cycles);
        }

        let pick = self.rng.random_range(0..self.remaining.len());
        let index = self.remaining.swap_remove(pick);
        self.set.get(index)
    }

    /// Items left before the current cycle ends
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    /// Completed cycles since the last reset
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn set(&self) -> &AggregatedSet {
        &self.set
    }

    fn refill(&mut self) {
        self.remaining = (0..self.set.len()).collect();
    }
}

impl<R: Rng> Iterator for ShuffleBag<R> {
    type Item = FeedItem;

    fn next(&mut self) -> Option<FeedItem> {
        self.draw().cloned()
    }
}
