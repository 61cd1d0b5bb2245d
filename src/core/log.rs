//! Logging setup for the binary.
//!
//! Output goes to stderr so the price stream and tables on stdout stay
//! readable. `RUST_LOG` overrides the defaults below.
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter: only this crate's own events, and only warnings unless
/// `verbose` is set. Ticker and oracle chatter lives at debug.
pub fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "warn" };
    format!("{}={level},off", env!("CARGO_CRATE_NAME"))
}

pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}
