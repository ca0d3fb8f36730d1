//! Logging setup: `env_logger` behind the `log` facade, filtered by `DICEDUEL_LOG`
//! (any `env_logger` filter string, e.g. `debug` or `diceduel::combat=trace`).

use env_logger::{Builder, Env};

use crate::config::{DEFAULT_LOG_FILTER, LOG_ENV};

/// Install the logger. Returns false if one was already installed.
pub fn init() -> bool {
    Builder::from_env(Env::new().filter_or(LOG_ENV, DEFAULT_LOG_FILTER))
        .try_init()
        .is_ok()
}
