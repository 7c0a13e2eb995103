//! Counts in-flight work and drives a debounced "activity visible" flag.

mod active;
mod activity;
mod background;
mod owner;

pub use self::active::Active;
pub use self::activity::ActivityCounter;
pub use self::background::Background;
pub use self::owner::IndicatorOwner;

/// Default delay before a falling edge is applied.
pub const DEFAULT_DEBOUNCE: std::time::Duration = std::time::Duration::from_millis(170);

#[cfg(test)]
mod test_util {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use crate::IndicatorOwner;

    /// An owner that remembers every visibility write.
    #[derive(Clone, Default)]
    pub struct Recorder(Arc<Mutex<Vec<bool>>>);

    // ===== impl Recorder =====

    impl Recorder {
        pub fn history(&self) -> Vec<bool> {
            self.0.lock().expect("recorder lock").clone()
        }

        pub fn current(&self) -> Option<bool> {
            self.history().last().cloned()
        }
    }

    impl IndicatorOwner for Recorder {
        fn set_network_activity_indicator_visible(&mut self, visible: bool) {
            self.0.lock().expect("recorder lock").push(visible);
        }
    }

    /// Lets the background task drain its queue on a paused clock.
    pub async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}
