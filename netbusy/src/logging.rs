use std::env;

use log::debug;

use crate::config::{DEFAULT_LOG, ENV_LOG};

/// Installs an `env_logger` configured from `NETBUSY_LOG`.
///
/// Does nothing if a logger has already been installed.
pub fn init() {
    let filter = env::var(ENV_LOG).unwrap_or_else(|_| DEFAULT_LOG.to_owned());
    let installed = env_logger::Builder::new()
        .format_timestamp_millis()
        .format_module_path(true)
        .parse_filters(&filter)
        .try_init();

    if installed.is_err() {
        debug!("logger already installed; ignoring {}", ENV_LOG);
    }
}
