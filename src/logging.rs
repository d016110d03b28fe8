use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// Installs the global subscriber, writing to stderr so command output on stdout
/// stays clean. `RUST_LOG` wins over the default level.
pub fn init(verbose: bool) {
    TRACING_INIT.call_once(|| {
        let default = if verbose { "movebooks=debug" } else { "movebooks=info" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    });
}
