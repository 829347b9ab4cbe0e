use tracing_subscriber::EnvFilter;

/// Initialize tracing from `RUST_LOG`.
///
/// `try_init()` is idempotent: the first call in the process succeeds,
/// subsequent calls are silently ignored.
pub fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
