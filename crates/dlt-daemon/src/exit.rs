//! Shared shutdown request flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::error::DaemonError;

/// Set once, never cleared. Checked by the run loop between iterations.
#[derive(Debug, Clone, Default)]
pub struct ExitFlag(Arc<AtomicBool>);

impl ExitFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        if !self.0.swap(true, Ordering::SeqCst) {
            info!("Daemon exit requested");
        }
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Request exit on SIGINT or SIGTERM.
    pub fn install_signal_handler(&self) -> Result<(), DaemonError> {
        let flag = Arc::clone(&self.0);
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .map_err(|e| DaemonError::Config(format!("cannot install signal handler: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_visible_through_clones() {
        let flag = ExitFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_requested());
        flag.request();
        flag.request();
        assert!(observer.is_requested());
    }
}
