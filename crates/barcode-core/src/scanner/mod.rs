//! Scanner-versus-human classification.
//!
//! This module contains the pure state machine at the heart of the bridge.
//! It has no OS dependencies: the capture engine stamps each key press with
//! an [`std::time::Instant`] and feeds it to [`ScanClassifier::process`].
//!
//! # The scanner heuristic (for beginners)
//!
//! A keyboard-wedge barcode scanner types every character of a code within a
//! few milliseconds of the previous one (typically < 50 ms) and ends with
//! Enter.  A person typing rarely manages less than ~150 ms between keys.
//! The classifier therefore keeps a *pending sequence* of characters and
//! throws it away whenever the gap to the previous key exceeds
//! [`ScannerConfig::max_key_interval`] (100 ms by default).  When the
//! terminator key arrives while characters are pending, they form a
//! [`Barcode`].
//!
//! ```text
//!  key:    9    0    2    9    Enter          H   i        Enter
//!  gap:        12ms 11ms 13ms  12ms       2.1s  180ms      240ms
//!          └──────── scanner ────────┘   └──── human ────┘
//!  result:                    Barcode("9029")                 (nothing)
//! ```

mod classifier;
mod config;
mod event;

pub use classifier::{KeyOutcome, ScanClassifier};
pub use config::{ScannerConfig, ScannerConfigError, DEFAULT_MAX_KEY_INTERVAL, DEFAULT_MAX_LENGTH};
pub use event::{Barcode, KeyAction, KeyEvent};
