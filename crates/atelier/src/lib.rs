pub mod app;
pub mod cli;
pub mod domain;
pub mod infra;
pub mod ui;

use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber. `ATELIER_LOG` sets the filter unless `verbose` is set.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("ATELIER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
