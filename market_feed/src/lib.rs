//! Market feed core: live quotes and the rolling tick window.
//!
//! Data flow: a [`TickSource`] delivers ticks for the observed instrument to the
//! callback registered through a [`SubscriptionRegistry`]. The callback merges each
//! tick into the [`QuoteStore`] and appends it to the [`WindowBuffer`]; presentation
//! code reads copies from both.
//!
//! - `feed`: tick sources (`TickGenerator`, `ManualFeed`) and per-symbol subscriptions.
//! - `store`: `QuoteStore` and `WindowBuffer`.
//! - `init`: all-or-nothing seeding of the initial quote set.
//! - `dashboard`: `MarketDashboard`, owner of the observed-instrument lifecycle.
//!
//! Concurrency:
//! - Every generator stream runs on its own worker thread; ticks for one symbol
//!   arrive in order, with no ordering across symbols.
//! - Stopping a stream is synchronous: once `stop` returns, its callback is not
//!   invoked again.
//! - Lock poisoning is never fatal; guards are recovered and the last written
//!   state is kept.
pub mod dashboard;
pub mod feed;
pub mod init;
pub mod store;

pub use dashboard::MarketDashboard;
pub use feed::manual::{ManualFeed, ManualHandle};
pub use feed::subscription::{Subscription, SubscriptionRegistry};
pub use feed::tick_generator::{FeedHandle, GeneratorHandle, PriceWalk, TickGenerator, TickSource};
pub use init::{QuoteSeeder, SyntheticSeeder, initialize, initialize_with_retry};
pub use store::quote_store::QuoteStore;
pub use store::window_buffer::WindowBuffer;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `mutex`, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn lock_recovers_poisoned_mutex() {
        let shared = Arc::new(Mutex::new(vec![1, 2]));
        let poisoner = Arc::clone(&shared);
        let result = thread::spawn(move || {
            let mut guard = poisoner.lock().unwrap();
            guard.push(3);
            panic!("holder died mid-update");
        })
        .join();
        assert!(result.is_err());
        assert!(shared.is_poisoned());

        lock(&shared).push(4);
        assert_eq!(*lock(&shared), vec![1, 2, 3, 4]);
    }
}
