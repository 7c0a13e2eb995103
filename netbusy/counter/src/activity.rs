use log::{trace, warn};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::mpsc;

use crate::active::Active;
use crate::background::{Background, Command};
use crate::owner::IndicatorOwner;

/// Counts in-flight requests and publishes a debounced visibility signal.
///
/// Handles are cheap to clone and may be used from any thread. Mutations of
/// the count are atomic; everything that touches the indicator owner happens
/// on the [`Background`] task returned by [`ActivityCounter::new`].
#[derive(Clone, Debug)]
pub struct ActivityCounter {
    count: Arc<AtomicUsize>,
    tx: mpsc::UnboundedSender<Command>,
}

// ===== impl ActivityCounter =====

impl ActivityCounter {
    /// Builds a counter whose falling edges are delayed by `debounce`.
    ///
    /// The returned `Background` must be driven on the context that owns the
    /// indicator, e.g. `tokio::spawn(background.run())`.
    pub fn new(debounce: Duration) -> (Self, Background) {
        let count = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::unbounded_channel();
        let counter = ActivityCounter {
            count: count.clone(),
            tx,
        };
        (counter, Background::new(count, rx, debounce))
    }

    pub fn increment(&self) {
        let prev = self.count.fetch_add(1, Ordering::AcqRel);
        trace!("activity count {} -> {}", prev, prev + 1);
        self.send(Command::Refresh);
    }

    /// Decrements the count, clamping at zero.
    pub fn decrement(&self) {
        let prev = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_sub(1))
            })
            .unwrap_or_else(|n| n);

        if prev == 0 {
            if cfg!(debug_assertions) {
                warn!("activity count decremented while already zero; clamping");
            }
        } else {
            trace!("activity count {} -> {}", prev, prev - 1);
        }
        self.send(Command::Refresh);
    }

    /// Increments now and decrements when the returned guard is dropped.
    pub fn active(&self) -> Active {
        Active::new(self.clone())
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Whether any activity is ongoing right now, ignoring the debounce.
    pub fn is_visible(&self) -> bool {
        self.count() > 0
    }

    /// Replaces the indicator sink and applies the current visibility to it.
    pub fn set_owner<O: IndicatorOwner>(&self, owner: O) {
        self.send(Command::SetOwner(Some(Box::new(owner))));
    }

    /// Drops the indicator sink. Visibility changes are discarded until a new
    /// owner is set.
    pub fn clear_owner(&self) {
        self.send(Command::SetOwner(None));
    }

    fn send(&self, cmd: Command) {
        if self.tx.send(cmd).is_err() {
            trace!("indicator task has stopped; dropping visibility update");
        }
    }
}
