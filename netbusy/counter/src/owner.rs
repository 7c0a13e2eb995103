use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::watch;

/// An object that owns a network activity indicator.
///
/// The owner is only ever touched from the counter's background task.
pub trait IndicatorOwner: Send + 'static {
    fn set_network_activity_indicator_visible(&mut self, visible: bool);
}

impl IndicatorOwner for Box<dyn IndicatorOwner> {
    fn set_network_activity_indicator_visible(&mut self, visible: bool) {
        (**self).set_network_activity_indicator_visible(visible)
    }
}

/// A flag that can be polled from anywhere.
impl IndicatorOwner for Arc<AtomicBool> {
    fn set_network_activity_indicator_visible(&mut self, visible: bool) {
        self.store(visible, Ordering::Release);
    }
}

/// Publishes to every `watch::Receiver`; receivers are only woken on change.
impl IndicatorOwner for watch::Sender<bool> {
    fn set_network_activity_indicator_visible(&mut self, visible: bool) {
        self.send_if_modified(|current| {
            let changed = *current != visible;
            *current = visible;
            changed
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_owner_only_notifies_on_change() {
        let (mut tx, mut rx) = watch::channel(false);
        rx.mark_unchanged();

        tx.set_network_activity_indicator_visible(false);
        assert!(!rx.has_changed().expect("sender alive"));

        tx.set_network_activity_indicator_visible(true);
        assert!(rx.has_changed().expect("sender alive"));
        assert!(*rx.borrow_and_update());
    }

    #[test]
    fn atomic_owner_stores_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut owner: Box<dyn IndicatorOwner> = Box::new(flag.clone());
        owner.set_network_activity_indicator_visible(true);
        assert!(flag.load(Ordering::Acquire));
    }
}
