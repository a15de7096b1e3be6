//! Key code translation for barcode capture.
//!
//! Captured key presses arrive as Windows Virtual Key codes.  The scanner
//! classifier only cares about the characters a barcode can contain, so this
//! module exposes a single lookup from VK code to character.

pub mod windows_vk;

pub use windows_vk::{vk_to_char, VK_OEM_MINUS, VK_OEM_PLUS, VK_RETURN, VK_TAB};
