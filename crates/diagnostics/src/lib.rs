// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Logging facade shared by the mkpages crates
//!
//! Usage:
//! - Set MKPAGES_LOG=off (default) - no logs
//! - Set MKPAGES_LOG=info - one line per page and per run step
//! - Set MKPAGES_LOG=debug - state transitions, URLs, file writes

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable selecting the log level
pub const LOG_ENV: &str = "MKPAGES_LOG";

static INIT: Once = Once::new();

/// Map a level name to a minimum emit level. `None` means logging is off.
///
/// Returns `Err` with the fallback level for names we don't recognize.
pub fn parse_level(name: &str) -> Result<Option<emit::Level>, emit::Level> {
    match name.trim().to_ascii_lowercase().as_str() {
        "off" | "" => Ok(None),
        "debug" => Ok(Some(emit::Level::Debug)),
        "info" => Ok(Some(emit::Level::Info)),
        "warn" => Ok(Some(emit::Level::Warn)),
        "error" => Ok(Some(emit::Level::Error)),
        _ => Err(emit::Level::Info),
    }
}

/// Initialize diagnostics based on the MKPAGES_LOG environment variable
///
/// Safe to call multiple times; only the first call has any effect.
pub fn init_diagnostics() {
    init_with_default("off");
}

/// Initialize diagnostics, using `default_level` when MKPAGES_LOG is unset
pub fn init_with_default(default_level: &str) {
    INIT.call_once(|| {
        let log_level = std::env::var(LOG_ENV).unwrap_or_else(|_| default_level.to_string());

        let min = match parse_level(&log_level) {
            Ok(None) => return,
            Ok(Some(level)) => level,
            Err(fallback) => {
                // Bootstrap warning, emit isn't running yet
                eprintln!("Warning: Unknown {LOG_ENV} value '{log_level}', using 'info'");
                fallback
            }
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(min))
            .init();

        // The runtime lives for the rest of the process
        std::mem::forget(rt);
    });
}

/// Log basic operations (pages processed, archive written)
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log detailed diagnostics (state transitions, request URLs, file writes)
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log warning conditions (skipped menu items, stale output removed)
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log failures (page abandoned, run aborted)
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

/// Re-export the init function for convenience
pub use init_diagnostics as init;
