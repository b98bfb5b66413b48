use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const APP_NAME: &str = "p2pstore_backend";

pub fn print_banner() {
    println!("{APP_NAME} {}", env!("CARGO_PKG_VERSION"));
}

/// Process-wide force-refresh switch. While set, every "already cached"
/// short-circuit is bypassed and assets are fetched again.
#[derive(Debug, Clone, Default)]
pub struct RefreshFlag(Arc<AtomicBool>);

impl RefreshFlag {
    pub fn new(initial: bool) -> Self {
        Self(Arc::new(AtomicBool::new(initial)))
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, value: bool) {
        self.0.store(value, Ordering::Relaxed);
    }
}
