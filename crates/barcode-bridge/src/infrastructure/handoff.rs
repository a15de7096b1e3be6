//! Channel hand-off from the capture thread to barcode consumers.
//!
//! Each sink here enqueues without blocking.  A bounded tokio channel that is
//! full rejects the barcode instead of waiting, since the caller sits inside
//! the OS keyboard hook.

use std::sync::mpsc as std_mpsc;

use barcode_core::Barcode;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::application::capture_engine::{BarcodeSink, SinkError};

impl BarcodeSink for mpsc::Sender<Barcode> {
    fn deliver(&self, barcode: Barcode) -> Result<(), SinkError> {
        self.try_send(barcode).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Unavailable("channel full".to_string()),
            TrySendError::Closed(_) => SinkError::Unavailable("channel closed".to_string()),
        })
    }
}

impl BarcodeSink for mpsc::UnboundedSender<Barcode> {
    fn deliver(&self, barcode: Barcode) -> Result<(), SinkError> {
        self.send(barcode)
            .map_err(|_| SinkError::Unavailable("channel closed".to_string()))
    }
}

impl BarcodeSink for std_mpsc::Sender<Barcode> {
    fn deliver(&self, barcode: Barcode) -> Result<(), SinkError> {
        self.send(barcode)
            .map_err(|_| SinkError::Unavailable("channel closed".to_string()))
    }
}
