use ferrite_hash::common::logger as core_logger;
use log::LevelFilter;

/// Keeps split and doubling chatter out of test output; `RUST_LOG` still wins.
pub fn init_test_logger() {
    core_logger::initialize_logger_with_level(LevelFilter::Warn);
}
