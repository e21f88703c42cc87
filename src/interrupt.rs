//! Routes Ctrl-C for the whole process: it cancels the request in flight if
//! there is one, otherwise it asks the input loop to stop.

use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    Request,
    Shutdown,
}

#[derive(Default)]
pub struct Interrupts {
    shutdown: CancellationToken,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl Interrupts {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Cancelled once the user interrupts while no request is running.
    pub fn shutdown(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub fn begin_request(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.slot() = Some(token.clone());
        token
    }

    pub fn end_request(&self) {
        self.slot().take();
    }

    pub fn interrupt(&self) -> Interrupted {
        match self.slot().take() {
            Some(token) => {
                token.cancel();
                Interrupted::Request
            }
            None => {
                self.shutdown.cancel();
                Interrupted::Shutdown
            }
        }
    }

    /// Installs the single Ctrl-C listener for the process.
    pub fn listen(self: &Arc<Self>) -> JoinHandle<()> {
        let interrupts = self.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl-C: {}", e);
                    return;
                }
                match interrupts.interrupt() {
                    Interrupted::Request => info!("Request cancelled by user"),
                    Interrupted::Shutdown => return,
                }
            }
        })
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }
}
