pub mod config;
pub mod models;
pub mod normalize; // Shape normalizer + field coercers
pub mod timeline; // Record merger + day grouper
pub mod journey; // Epoch weeks, metric rows, labs
pub mod live; // Live two-feed view
pub mod chat;
pub mod home;
pub mod context; // "Ask why" day context

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} engine starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}
