use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber, honouring `RUST_LOG` when set.
/// Later calls are no-ops, so tests and the binary can both call it.
pub fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new("p2pstore_backend=info,tower_http=info"));
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
