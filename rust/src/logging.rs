use std::sync::Once;

static INIT: Once = Once::new();

/// Install the global tracing subscriber. Safe to call repeatedly; tests
/// construct several cores in one process.
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .try_init();
    });
}
