use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing with an env-filter driven subscriber.
///
/// Safe to call more than once; subsequent calls are no-ops so tests can
/// share the helper without fighting over the global subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "splitpay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
