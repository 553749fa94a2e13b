//! FILENAME: core/crosstab-engine/src/logging.rs
// PURPOSE: Category-tagged logging macros for the crosstab pipeline.
// CONTEXT: The library only emits through the `log` facade; installing a
// logger is the host application's job. The category becomes the log target.

/// Log categories used across the crate.
pub const CAT_CROSSTAB: &str = "CROSSTAB";
pub const CAT_QUERY: &str = "QUERY";
pub const CAT_FOLD: &str = "FOLD";

macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        ::log::debug!(target: $cat, $($arg)*)
    };
}

macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        ::log::info!(target: $cat, $($arg)*)
    };
}

macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        ::log::warn!(target: $cat, $($arg)*)
    };
}
