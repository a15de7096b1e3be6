//! ForwardBarcodesUseCase: sends each scanned barcode to the print service.
//!
//! The use case sits on the consumer side of the capture channel.  Barcodes
//! are forwarded strictly one at a time, in the order they were scanned, and a
//! failure to forward one barcode never affects the next.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use barcode_core::Barcode;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

/// Response line returned by the print service for one barcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintResponse {
    /// The service accepted the job.
    Success(String),
    /// The service answered, but not with an acceptance.
    Rejected(String),
}

impl PrintResponse {
    /// Classifies a raw response line.
    ///
    /// A line starting with `OK` or containing `SUCCESS` is a success;
    /// anything else, including an empty line, is a rejection.
    pub fn classify(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.starts_with("OK") || line.contains("SUCCESS") {
            Self::Success(line.to_string())
        } else {
            Self::Rejected(line.to_string())
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Error type for a single forward attempt.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("could not connect to print service at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("print service I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("timed out while {0}")]
    Timeout(&'static str),
}

/// Sends one barcode to a print service and returns its response.
///
/// Infrastructure implements this over TCP; tests use a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BarcodeForwarder: Send + Sync {
    async fn forward(&self, barcode: &Barcode) -> Result<PrintResponse, ForwardError>;
}

/// Result of handling one barcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    Printed,
    Rejected(String),
    Failed(String),
}

/// Snapshot of the bridge's forwarding activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeStatus {
    pub last_barcode: Option<Barcode>,
    pub last_outcome: Option<ForwardOutcome>,
    pub printed: u64,
    pub rejected: u64,
    pub failed: u64,
}

impl BridgeStatus {
    /// Total number of barcodes handled.
    pub fn handled(&self) -> u64 {
        self.printed + self.rejected + self.failed
    }

    fn record(&mut self, barcode: Barcode, outcome: ForwardOutcome) {
        match &outcome {
            ForwardOutcome::Printed => self.printed += 1,
            ForwardOutcome::Rejected(_) => self.rejected += 1,
            ForwardOutcome::Failed(_) => self.failed += 1,
        }
        self.last_barcode = Some(barcode);
        self.last_outcome = Some(outcome);
    }
}

/// Consumes barcodes from the capture channel and forwards them.
pub struct ForwardBarcodesUseCase {
    forwarder: Arc<dyn BarcodeForwarder>,
    status: Mutex<BridgeStatus>,
}

impl ForwardBarcodesUseCase {
    pub fn new(forwarder: Arc<dyn BarcodeForwarder>) -> Self {
        Self {
            forwarder,
            status: Mutex::new(BridgeStatus::default()),
        }
    }

    /// Forwards a single barcode and records the outcome.
    pub async fn handle_barcode(&self, barcode: Barcode) -> ForwardOutcome {
        let outcome = match self.forwarder.forward(&barcode).await {
            Ok(PrintResponse::Success(line)) => {
                info!(barcode = %barcode, response = %line, "print job accepted");
                ForwardOutcome::Printed
            }
            Ok(PrintResponse::Rejected(line)) => {
                warn!(barcode = %barcode, response = %line, "print job rejected");
                ForwardOutcome::Rejected(line)
            }
            Err(e) => {
                error!(barcode = %barcode, "print forwarding failed: {e}");
                ForwardOutcome::Failed(e.to_string())
            }
        };

        self.status.lock().await.record(barcode, outcome.clone());
        outcome
    }

    /// Forwards barcodes in arrival order until every sender is dropped.
    pub async fn run(&self, mut rx: mpsc::Receiver<Barcode>) {
        while let Some(barcode) = rx.recv().await {
            self.handle_barcode(barcode).await;
        }
        info!("barcode channel closed; forwarding stopped");
    }

    /// Returns a copy of the current status.
    pub async fn status(&self) -> BridgeStatus {
        self.status.lock().await.clone()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
