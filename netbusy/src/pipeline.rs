use http::Extensions;
use log::debug;
use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};

use crate::interceptor::Outcome;

/// A hook invoked before every request a pipeline dispatches.
pub trait RequestHook: Send + Sync + 'static {
    /// Inspects a request about to be dispatched.
    ///
    /// A returned `Terminal` is told how the request ended, exactly once.
    fn on_dispatch(&self, extensions: &mut Extensions) -> Option<Box<dyn Terminal>>;
}

/// Receives the terminal outcome of a dispatched request.
pub trait Terminal: Send + 'static {
    fn finish(&mut self, outcome: Outcome);
}

/// An ordered, shareable list of request hooks.
///
/// Clones share the same list.
#[derive(Clone, Default)]
pub struct HookChain(Arc<Mutex<Vec<Arc<dyn RequestHook>>>>);

/// Keeps a hook attached to a chain until `detach` is called.
#[must_use = "a binding should be detached explicitly"]
pub struct Binding {
    chain: HookChain,
    hook: Arc<dyn RequestHook>,
}

/// The terminals collected for one dispatched request.
///
/// Each terminal fires once. Dropping unfinished terminals reports
/// `Outcome::Cancelled`.
#[derive(Default)]
pub struct Terminals(Vec<Box<dyn Terminal>>);

// ===== impl HookChain =====

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide pipeline.
    pub fn shared() -> &'static HookChain {
        static SHARED: OnceLock<HookChain> = OnceLock::new();
        SHARED.get_or_init(HookChain::new)
    }

    /// Inserts `hook` at the front of the chain, so that it observes requests
    /// before any hook that might answer them itself.
    ///
    /// Attaching a hook that is already present leaves the chain unchanged.
    pub fn attach(&self, hook: Arc<dyn RequestHook>) -> Binding {
        {
            let mut hooks = self.lock();
            if hooks.iter().any(|h| same_hook(h, &hook)) {
                debug!("hook already attached");
            } else {
                hooks.insert(0, hook.clone());
                debug!("hook attached; {} in chain", hooks.len());
            }
        }

        Binding {
            chain: self.clone(),
            hook,
        }
    }

    pub fn contains(&self, hook: &Arc<dyn RequestHook>) -> bool {
        self.lock().iter().any(|h| same_hook(h, hook))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Runs every hook, in order, against a request about to be dispatched.
    pub fn dispatch(&self, extensions: &mut Extensions) -> Terminals {
        // Hooks run outside the lock so they may attach or detach freely.
        let hooks = self.lock().clone();
        let terminals = hooks
            .iter()
            .filter_map(|hook| hook.on_dispatch(extensions))
            .collect();
        Terminals(terminals)
    }

    fn remove(&self, hook: &Arc<dyn RequestHook>) -> bool {
        let mut hooks = self.lock();
        let before = hooks.len();
        hooks.retain(|h| !same_hook(h, hook));
        let removed = hooks.len() != before;
        if removed {
            debug!("hook detached; {} in chain", hooks.len());
        }
        removed
    }

    fn lock(&self) -> MutexGuard<Vec<Arc<dyn RequestHook>>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for HookChain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("HookChain").field("len", &self.len()).finish()
    }
}

fn same_hook(a: &Arc<dyn RequestHook>, b: &Arc<dyn RequestHook>) -> bool {
    // Compare data pointers only; vtables may differ across codegen units.
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

// ===== impl Binding =====

impl Binding {
    /// Removes the hook from its chain. Detaching twice is harmless.
    pub fn detach(self) {
        self.chain.remove(&self.hook);
    }

    pub fn is_attached(&self) -> bool {
        self.chain.contains(&self.hook)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Binding")
            .field("attached", &self.is_attached())
            .finish()
    }
}

// ===== impl Terminals =====

impl Terminals {
    /// Reports `outcome` to every terminal. Returns `false` if they had
    /// already been finished.
    pub fn finish(&mut self, outcome: Outcome) -> bool {
        if self.0.is_empty() {
            return false;
        }
        for mut terminal in self.0.drain(..) {
            terminal.finish(outcome);
        }
        true
    }

    pub fn is_finished(&self) -> bool {
        self.0.is_empty()
    }
}

impl Drop for Terminals {
    fn drop(&mut self) {
        self.finish(Outcome::Cancelled);
    }
}

impl fmt::Debug for Terminals {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Terminals").field(&self.0.len()).finish()
    }
}
