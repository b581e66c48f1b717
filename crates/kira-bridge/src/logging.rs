//! Logging setup for the bridge.
//!
//! Library code only talks to the `log` facade. Hosts that want output install the
//! `env_logger` backend through [`init_logger`] or [`try_init_logger`]; the filter is
//! read from `KIRA_LOG` and falls back to `info`.

pub use log::{debug, error, info, warn};

pub const LOG_ENV_VAR: &str = "KIRA_LOG";

pub fn init_logger() -> env_logger::Builder {
    let env = env_logger::Env::new().filter_or(LOG_ENV_VAR, "info");
    let mut builder = env_logger::Builder::from_env(env);
    builder.format_timestamp_millis().format_target(true);
    builder
}

/// Installs the logger once. Returns `false` if a logger was already set.
pub fn try_init_logger() -> bool {
    init_logger().try_init().is_ok()
}
