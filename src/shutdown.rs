// Shutdown module - Operator stop requests

use crate::error::{RelaunchError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation flag shared between the supervisor and the signal handler.
///
/// The handler only stores into the flag; every cleanup step runs in the
/// supervisor loop after it observes the request.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the supervisor to stop
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Route SIGINT and SIGTERM to `flag`.
///
/// Can only be installed once per process.
pub fn install_signal_handlers(flag: &ShutdownFlag) -> Result<()> {
    let flag = flag.clone();
    ctrlc::set_handler(move || flag.request()).map_err(|e| {
        RelaunchError::SignalError(format!("Failed to install signal handler: {}", e))
    })
}
