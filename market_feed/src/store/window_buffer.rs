//! Bounded tick history backing the live chart.

use market_common::Tick;
use market_common::config::DEFAULT_WINDOW_CAPACITY;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// FIFO of the most recent ticks for the observed instrument.
///
/// Holds at most `capacity` ticks; pushing past the capacity drops the oldest.
#[derive(Debug)]
pub struct WindowBuffer {
    capacity: usize,
    ticks: Mutex<VecDeque<Tick>>,
}

impl WindowBuffer {
    /// Creates an empty buffer. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        WindowBuffer {
            capacity,
            ticks: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    fn ticks(&self) -> MutexGuard<'_, VecDeque<Tick>> {
        self.ticks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `tick`, then drops from the front until the capacity holds.
    pub fn push(&self, tick: Tick) {
        let mut ticks = self.ticks();
        ticks.push_back(tick);
        while ticks.len() > self.capacity {
            ticks.pop_front();
        }
    }

    /// Removes every tick.
    pub fn reset(&self) {
        self.ticks().clear();
    }

    /// Copy of the buffered ticks, oldest first.
    pub fn snapshot(&self) -> Vec<Tick> {
        self.ticks().iter().cloned().collect()
    }

    /// Most recent tick, if any.
    pub fn latest(&self) -> Option<Tick> {
        self.ticks().back().cloned()
    }

    /// Lowest and highest buffered price, or `None` when empty.
    pub fn price_range(&self) -> Option<(f64, f64)> {
        self.ticks().iter().fold(None, |range, tick| match range {
            None => Some((tick.price, tick.price)),
            Some((min, max)) => Some((min.min(tick.price), max.max(tick.price))),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.ticks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks().is_empty()
    }
}

impl Default for WindowBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}
