use std::sync::Once;

use env_logger::Builder;
use log::LevelFilter;

static INIT: Once = Once::new();

/// Installs the process-wide logger at `Info`, letting `RUST_LOG` override it.
pub fn initialize_logger() {
    initialize_logger_with_level(LevelFilter::Info);
}

/// Installs the process-wide logger with `level` for this crate's modules.
///
/// Only the first call in a process has any effect.
pub fn initialize_logger_with_level(level: LevelFilter) {
    // call_once_force recovers if an earlier initialization attempt panicked
    INIT.call_once_force(|_| {
        let mut builder = Builder::new();

        builder
            .filter_level(LevelFilter::Warn)
            .filter_module("ferrite_hash", level)
            .format_timestamp_millis()
            .parse_default_env();

        // the logger may already be set by the embedding application
        let _ = builder.try_init();
    });
}
