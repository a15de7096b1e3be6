//! # barcode-core
//!
//! Shared library for Barcode Bridge containing the virtual-key translation
//! table and the timing-based classifier that separates barcode-scanner bursts
//! from human typing.
//!
//! This crate has zero dependencies on OS APIs, UI frameworks, or network
//! sockets.  Everything in it can be unit-tested on any platform.
//!
//! # Architecture overview (for beginners)
//!
//! A USB barcode scanner usually pretends to be a keyboard: when it reads a
//! code it "types" the characters very quickly and finishes with Enter.  The
//! bridge application listens to every key press on the machine and has to
//! decide which presses came from the scanner.
//!
//! - **`keymap`** – Converts Windows virtual key codes (`VK_*`) into the small
//!   set of characters a barcode can contain: digits, `A`–`Z`, `-` and `+`.
//!
//! - **`scanner`** – The classifier state machine.  It receives timestamped
//!   key events, keeps characters that arrive quickly enough to be
//!   scanner-generated, and produces a [`Barcode`] when the terminator key
//!   arrives.

pub mod keymap;
pub mod scanner;

pub use keymap::vk_to_char;
pub use scanner::{
    Barcode, KeyAction, KeyEvent, KeyOutcome, ScanClassifier, ScannerConfig, ScannerConfigError,
};
