//! Tracing initialisation for the `muster` binary

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber
///
/// `RUST_LOG` wins when set; otherwise the level is `info`, or `debug` with
/// `verbose`. `json` switches the formatter to one JSON object per line.
pub fn init(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},hyper=warn,reqwest=warn")));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(false))
            .init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}
