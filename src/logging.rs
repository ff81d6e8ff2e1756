//! Logger initialisation.

use std::io::Write;

use env_logger::{Builder, Env, Target};

const DEFAULT_FILTER: &str = "warn,cuesync=info";

/// Install the global logger, filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls leave the first logger in place.
pub fn init_logger() {
    let env = Env::default().filter_or("RUST_LOG", DEFAULT_FILTER);

    let result = Builder::from_env(env)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(Target::Stderr)
        .try_init();

    if result.is_err() {
        log::debug!("Logger already initialised");
    }
}

/// Logger for tests: output is captured by the test harness
pub fn init_test_logger() {
    let _ = Builder::from_env(Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}
