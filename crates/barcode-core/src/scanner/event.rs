//! Input and output values of the classifier.

use std::fmt;
use std::time::Instant;

/// Whether a key went down or came back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Down,
    Up,
}

/// A single key notification, stamped with its arrival time.
///
/// The timestamp is taken by the capture engine when the notification is
/// received, not from the OS message, so that every event shares one
/// monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Windows Virtual Key code.
    pub vk_code: u32,
    pub action: KeyAction,
    /// Monotonic arrival time.
    pub at: Instant,
}

impl KeyEvent {
    /// Creates a key-down event.
    pub fn down(vk_code: u32, at: Instant) -> Self {
        Self {
            vk_code,
            action: KeyAction::Down,
            at,
        }
    }

    /// Creates a key-up event.
    pub fn up(vk_code: u32, at: Instant) -> Self {
        Self {
            vk_code,
            action: KeyAction::Up,
            at,
        }
    }
}

/// A completed barcode, as typed by the scanner (terminator excluded).
///
/// Barcodes are immutable once produced; the only way to obtain one outside
/// this crate is from [`super::ScanClassifier::process`] or [`Barcode::from`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Barcode(String);

impl Barcode {
    /// Returns the barcode text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of characters in the barcode.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the barcode and returns the owned text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for Barcode {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Barcode {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<Barcode> for String {
    fn from(value: Barcode) -> Self {
        value.0
    }
}

impl AsRef<str> for Barcode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
