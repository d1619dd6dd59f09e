use crate::error::{ExtractError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct GracefulShutdown {
    running: Arc<AtomicBool>,
}

impl GracefulShutdown {
    pub fn new() -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();
        let message_shown = AtomicBool::new(false);

        // First Ctrl+C finishes the current file and stops; the second exits.
        ctrlc::set_handler(move || {
            running_clone.store(false, Ordering::SeqCst);

            if !message_shown.swap(true, Ordering::SeqCst) {
                eprintln!("\n🛑 Stopping after the current file... (press Ctrl+C again to force exit)");
            } else {
                eprintln!("\n💀 Force stopping...");
                std::process::exit(130);
            }
        })
        .map_err(|e| ExtractError::Config {
            message: format!("Failed to set signal handler: {}", e),
        })?;

        Ok(Self { running })
    }

    /// No signal handler is registered; for tests and embedding.
    pub fn new_for_test() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn check_shutdown(&self) -> Result<()> {
        if !self.is_running() {
            return Err(ExtractError::Cancelled);
        }
        Ok(())
    }

    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_request() {
        let shutdown = GracefulShutdown::new_for_test();
        assert!(shutdown.is_running());
        assert!(shutdown.check_shutdown().is_ok());

        shutdown.request_shutdown();
        assert!(!shutdown.is_running());
        assert!(matches!(
            shutdown.check_shutdown(),
            Err(ExtractError::Cancelled)
        ));
    }
}
