use http::Extensions;
use log::trace;
use netbusy_counter::{Active, ActivityCounter};
use std::sync::Arc;

use crate::pipeline::{Binding, HookChain, RequestHook, Terminal};

/// Counts every request it sees while attached to a pipeline.
///
/// Clones share one hook, so attaching any of them to a chain twice leaves a
/// single entry.
#[derive(Clone, Debug)]
pub struct Interceptor {
    hook: Arc<Hook>,
}

/// The chain entry shared by an interceptor and its clones.
#[derive(Debug)]
struct Hook {
    counter: ActivityCounter,
}

/// Marks a request as already counted, so that a request re-dispatched
/// through the same pipeline is not counted twice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tracked;

/// How a tracked request ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
    Cancelled,
}

/// The lifetime of one tracked request.
///
/// The activity count is decremented exactly once: on the first `finish`, or
/// when dropped unfinished.
#[derive(Debug)]
pub struct Tracking {
    active: Active,
}

// ===== impl Interceptor =====

impl Interceptor {
    pub fn new(counter: ActivityCounter) -> Self {
        Self {
            hook: Arc::new(Hook { counter }),
        }
    }

    /// An interceptor feeding the process-wide counter.
    pub fn shared() -> Self {
        Self::new(crate::counter().clone())
    }

    pub fn counter(&self) -> &ActivityCounter {
        &self.hook.counter
    }

    /// Starts tracking a request, unless it is already marked as tracked.
    pub fn start(&self, extensions: &mut Extensions) -> Option<Tracking> {
        self.hook.start(extensions)
    }

    pub fn attach_to(&self, chain: &HookChain) -> Binding {
        chain.attach(self.hook.clone())
    }

    /// Attaches to `HookChain::shared()`.
    pub fn attach_shared(&self) -> Binding {
        self.attach_to(HookChain::shared())
    }
}

// ===== impl Hook =====

impl Hook {
    fn start(&self, extensions: &mut Extensions) -> Option<Tracking> {
        if extensions.get::<Tracked>().is_some() {
            trace!("request already tracked; skipping");
            return None;
        }

        extensions.insert(Tracked);
        Some(Tracking {
            active: self.counter.active(),
        })
    }
}

impl RequestHook for Hook {
    fn on_dispatch(&self, extensions: &mut Extensions) -> Option<Box<dyn Terminal>> {
        self.start(extensions)
            .map(|tracking| Box::new(tracking) as Box<dyn Terminal>)
    }
}

// ===== impl Tracking =====

impl Tracking {
    /// Ends the request. Returns `false` if it had already ended.
    pub fn finish(&mut self, outcome: Outcome) -> bool {
        if self.active.is_released() {
            trace!("duplicate terminal {:?} ignored", outcome);
            return false;
        }
        trace!("request finished: {:?}", outcome);
        self.active.release()
    }

    pub fn is_finished(&self) -> bool {
        self.active.is_released()
    }
}

impl Terminal for Tracking {
    fn finish(&mut self, outcome: Outcome) {
        Tracking::finish(self, outcome);
    }
}

impl Drop for Tracking {
    fn drop(&mut self) {
        if !self.is_finished() {
            self.finish(Outcome::Cancelled);
        }
    }
}
