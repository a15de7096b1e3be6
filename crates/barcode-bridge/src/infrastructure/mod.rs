//! Infrastructure layer for the bridge.
//!
//! Contains OS-facing adapters: the keyboard hook, channel hand-off sinks,
//! the TCP print client, and configuration file storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `barcode_core`.  The `application` layer only reaches back in through the
//! [`input_capture::GlobalKeyListener`] capability trait and its value types.

pub mod handoff;
pub mod input_capture;
pub mod network;
pub mod storage;
