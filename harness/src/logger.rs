//! Tracing bootstrap for the harness binary.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the global subscriber. Diagnostics go to stderr so report
/// fallbacks on stdout stay machine-readable. `debug` raises the level.
pub fn init(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    // keep going if a test harness already installed one
    let _ = tracing::subscriber::set_global_default(subscriber);
}
