//! Application layer use cases for the bridge.
//!
//! Use cases in this layer orchestrate domain objects from `barcode_core`
//! and depend only on traits, never on OS APIs or sockets directly:
//!
//! - **`capture_engine`** – Owns the keyboard hook thread.  Every key
//!   notification is classified synchronously on that thread and completed
//!   barcodes are handed to a [`capture_engine::BarcodeSink`].  This is the
//!   latency-critical path: it runs inside the OS input pipeline.
//!
//! - **`forward_barcodes`** – Consumes barcodes on the async runtime and
//!   forwards each one to the print service through a
//!   [`forward_barcodes::BarcodeForwarder`], tracking the outcome.

pub mod capture_engine;
pub mod forward_barcodes;
