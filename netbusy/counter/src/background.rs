use log::{debug, trace};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    sync::mpsc,
    time::{self, Instant},
};

use crate::owner::IndicatorOwner;

/// Messages from counter handles to the task that owns the indicator.
pub(crate) enum Command {
    Refresh,
    SetOwner(Option<Box<dyn IndicatorOwner>>),
}

/// Applies visibility changes to the indicator owner.
///
/// All writes to the owner, and the hide timer, live on this one task, so
/// "show", "cancel hide" and "schedule hide" never interleave. The task runs
/// until every `ActivityCounter` handle has been dropped.
#[must_use = "the background task must be spawned for the indicator to update"]
pub struct Background {
    count: Arc<AtomicUsize>,
    rx: mpsc::UnboundedReceiver<Command>,
    owner: Option<Box<dyn IndicatorOwner>>,
    debounce: Duration,
}

// ===== impl Background =====

impl Background {
    pub(crate) fn new(
        count: Arc<AtomicUsize>,
        rx: mpsc::UnboundedReceiver<Command>,
        debounce: Duration,
    ) -> Self {
        Self {
            count,
            rx,
            owner: None,
            debounce,
        }
    }

    pub async fn run(mut self) {
        let hide = time::sleep(self.debounce);
        tokio::pin!(hide);
        let mut hide_pending = false;

        loop {
            tokio::select! {
                cmd = self.rx.recv() => match cmd {
                    Some(Command::Refresh) => {
                        if self.visible() {
                            if hide_pending {
                                trace!("new activity; cancelling pending hide");
                                hide_pending = false;
                            }
                            self.apply(true);
                        } else if !hide_pending {
                            trace!("activity stopped; hiding in {:?}", self.debounce);
                            hide.as_mut().reset(Instant::now() + self.debounce);
                            hide_pending = true;
                        }
                    }
                    Some(Command::SetOwner(owner)) => {
                        debug!("indicator owner {}", if owner.is_some() { "replaced" } else { "cleared" });
                        self.owner = owner;
                        hide_pending = false;
                        let visible = self.visible();
                        self.apply(visible);
                    }
                    None => {
                        debug!("all activity counters dropped; stopping indicator task");
                        return;
                    }
                },

                () = &mut hide, if hide_pending => {
                    hide_pending = false;
                    // Activity may have resumed after the hide was scheduled.
                    if !self.visible() {
                        self.apply(false);
                    }
                }
            }
        }
    }

    fn visible(&self) -> bool {
        self.count.load(Ordering::Acquire) > 0
    }

    fn apply(&mut self, visible: bool) {
        match self.owner {
            Some(ref mut owner) => owner.set_network_activity_indicator_visible(visible),
            None => trace!("no indicator owner; dropping visible={}", visible),
        }
    }
}
