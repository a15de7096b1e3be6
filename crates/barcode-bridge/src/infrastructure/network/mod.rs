//! Network infrastructure for the bridge.
//!
//! # Sub-modules
//!
//! - **`print_client`** – Sends one barcode per TCP connection to the print
//!   service and classifies the single response line it sends back.
//! - **`export_client`** – Downloads CSV or JSON label exports from the print
//!   service's HTTP API into the export folder.

pub mod export_client;
pub mod print_client;
