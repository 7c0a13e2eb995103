use log::{debug, error, warn};
use netbusy_counter::{ActivityCounter, Background};
use std::{sync::OnceLock, thread};
use tokio::{runtime, sync::watch};

use crate::config::Config;

struct Shared {
    counter: ActivityCounter,
    visible: watch::Receiver<bool>,
}

static SHARED: OnceLock<Shared> = OnceLock::new();

/// The process-wide activity counter.
///
/// Built on first use from `Config::from_env()` and driven by a dedicated
/// `netbusy-indicator` thread for the rest of the process.
pub fn counter() -> &'static ActivityCounter {
    &shared().counter
}

/// Watches the process-wide indicator.
///
/// Receivers stop seeing updates if the counter's owner is replaced with
/// `set_owner`.
pub fn subscribe() -> watch::Receiver<bool> {
    shared().visible.clone()
}

fn shared() -> &'static Shared {
    SHARED.get_or_init(|| {
        let config = Config::from_env().unwrap_or_else(|e| {
            warn!("{}; using default configuration", e);
            Config::default()
        });

        let (tx, visible) = watch::channel(false);
        let (counter, background) = ActivityCounter::new(config.debounce);
        counter.set_owner(tx);
        spawn_indicator(background);
        debug!("activity counter ready; debounce={:?}", config.debounce);

        Shared { counter, visible }
    })
}

fn spawn_indicator(background: Background) {
    let spawned = thread::Builder::new()
        .name("netbusy-indicator".into())
        .spawn(move || {
            let rt = runtime::Builder::new_current_thread().enable_time().build();
            match rt {
                Ok(rt) => rt.block_on(background.run()),
                Err(e) => error!("failed to build indicator runtime: {}", e),
            }
        });

    match spawned {
        Ok(_) => debug!("indicator thread started"),
        // Counting still works; visibility updates are discarded.
        Err(e) => error!("failed to spawn indicator thread: {}", e),
    }
}
