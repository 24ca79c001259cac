use tracing_subscriber::EnvFilter;

// env_filter = trace|debug|info|warn|error|off, RUST_LOG wins when set
pub fn init_subscriber(env_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
