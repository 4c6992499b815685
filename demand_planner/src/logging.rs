//! Logging bootstrap
//!
//! Library crates only emit `tracing` events; a binary or test installs the
//! subscriber once through this module.

use tracing_subscriber::{fmt, EnvFilter};

/// Workspace crates at `info`, dependencies at `warn`
pub const DEFAULT_DIRECTIVES: &str =
    "warn,plan_math=info,demand_forecast=info,replenishment=info,demand_planner=info";

/// Workspace crates at `debug` so per-SKU decisions show up in test output
pub const TEST_DIRECTIVES: &str =
    "warn,plan_math=debug,demand_forecast=debug,replenishment=debug,demand_planner=debug";

/// Filter from `RUST_LOG` when set, otherwise `default`
fn filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber for a planning binary
///
/// `RUST_LOG` overrides [`DEFAULT_DIRECTIVES`], e.g.
/// `RUST_LOG=replenishment=debug` to trace lead-time resolution.
///
/// ```no_run
/// demand_planner::logging::init();
/// ```
pub fn init() {
    fmt()
        .with_env_filter(filter_or(DEFAULT_DIRECTIVES))
        .with_target(true)
        .compact()
        .init();
}

/// Subscriber captured by the test harness; repeated calls are ignored
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(filter_or(TEST_DIRECTIVES))
        .with_test_writer()
        .without_time()
        .try_init();
}
