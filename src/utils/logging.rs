//! Per-module switchable logging.
//!
//! Tick paths fire every 100 ms, so the modules that own them keep their
//! own `ENABLE_LOGS` switch instead of relying on `RUST_LOG` alone:
//!
//! ```ignore
//! const ENABLE_LOGS: bool = false;
//! use crate::log_debug;
//!
//! log_debug!("tick {}", n);
//! ```

/// `log::debug!` gated by the calling module's `ENABLE_LOGS` const.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

/// `log::info!` gated by the calling module's `ENABLE_LOGS` const.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// `log::warn!` gated by the calling module's `ENABLE_LOGS` const.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Picks the default level filter; `RUST_LOG` still wins when set.
pub fn default_level(debug: bool) -> log::LevelFilter {
    if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
}

/// Reads `VITASIGNAL_DEBUG` the same way the rest of the host does.
pub fn debug_from_env() -> bool {
    std::env::var("VITASIGNAL_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
