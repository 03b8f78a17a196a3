//! Log setup for the `metagraph` binary.

use tracing_subscriber::EnvFilter;

/// Filter directives are read from this variable first; `-v` flags only
/// apply when it is unset or invalid.
pub const LOG_ENV: &str = "METAGRAPH_LOG";

pub fn init(verbose: u8) {
    let fallback = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    // Keep an already-installed subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
