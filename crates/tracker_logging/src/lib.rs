#![deny(missing_docs)]
//! Shared logging utilities for the tracker workspace.
//!
//! Every macro accepts either plain `format!` arguments or a leading
//! `track = <id>;` (or `album = <id>;`) clause, which prefixes the line with
//! `[track <id>]` so the interleaved output of concurrent pollers can be told
//! apart:
//!
//! ```ignore
//! tracker_info!(track = track_id; "poll returned {}", status);
//! tracker_warn!("search failed: {}", err);
//! ```

use std::str::FromStr;

use log::LevelFilter;

/// Environment variable read by [`initialize_for_tests`] to override the level.
pub const TEST_LOG_ENV: &str = "TRACKER_TEST_LOG";

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! tracker_trace {
    (track = $id:expr; $($arg:tt)*) => {{
        log::trace!("[track {}] {}", $id, format_args!($($arg)*));
    }};
    (album = $id:expr; $($arg:tt)*) => {{
        log::trace!("[album {}] {}", $id, format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! tracker_debug {
    (track = $id:expr; $($arg:tt)*) => {{
        log::debug!("[track {}] {}", $id, format_args!($($arg)*));
    }};
    (album = $id:expr; $($arg:tt)*) => {{
        log::debug!("[album {}] {}", $id, format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! tracker_info {
    (track = $id:expr; $($arg:tt)*) => {{
        log::info!("[track {}] {}", $id, format_args!($($arg)*));
    }};
    (album = $id:expr; $($arg:tt)*) => {{
        log::info!("[album {}] {}", $id, format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! tracker_warn {
    (track = $id:expr; $($arg:tt)*) => {{
        log::warn!("[track {}] {}", $id, format_args!($($arg)*));
    }};
    (album = $id:expr; $($arg:tt)*) => {{
        log::warn!("[album {}] {}", $id, format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! tracker_error {
    (track = $id:expr; $($arg:tt)*) => {{
        log::error!("[track {}] {}", $id, format_args!($($arg)*));
    }};
    (album = $id:expr; $($arg:tt)*) => {{
        log::error!("[album {}] {}", $id, format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Picks the level used by test loggers.
///
/// `raw` is the value of [`TEST_LOG_ENV`] if set. Unparseable values fall back
/// to the build default: debug in debug builds, info in release builds.
pub fn test_level(raw: Option<&str>) -> LevelFilter {
    let default = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    raw.and_then(|value| LevelFilter::from_str(value.trim()).ok())
        .unwrap_or(default)
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let raw = std::env::var(TEST_LOG_ENV).ok();
    let level = test_level(raw.as_deref());

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_override_is_parsed_case_insensitively() {
        assert_eq!(test_level(Some("warn")), LevelFilter::Warn);
        assert_eq!(test_level(Some(" TRACE ")), LevelFilter::Trace);
    }

    #[test]
    fn bogus_level_falls_back_to_build_default() {
        let fallback = test_level(None);
        assert_eq!(test_level(Some("loud")), fallback);
    }

    #[test]
    fn track_prefixed_macros_expand() {
        initialize_for_tests();
        let id = "4uLU6hMCjMI75M1A2tKUQC";
        tracker_debug!(track = id; "status {}", "queued");
        tracker_info!("plain {}", 1);
    }
}
