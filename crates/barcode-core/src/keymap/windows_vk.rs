//! Windows Virtual Key (VK) code to barcode character translation table.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).
//!
//! # What is a Windows Virtual Key (VK) code? (for beginners)
//!
//! Windows assigns each keyboard key a number called a "Virtual Key code".
//! These are defined in `<winuser.h>` and named `VK_*` (e.g., `VK_RETURN = 0x0D`,
//! `VK_NUMPAD5 = 0x65`).  They describe *logical* keys, not characters: the
//! digit 5 on the main row and the digit 5 on the numeric keypad are two
//! different VK codes that both produce the character `'5'`.
//!
//! A barcode scanner in keyboard-wedge mode types its payload as ordinary key
//! presses, so the bridge has to turn VK codes back into characters.  Only the
//! characters a barcode in this deployment can contain are mapped; everything
//! else (function keys, arrows, modifiers, …) maps to `None`.
//!
//! # How this table works
//!
//! `VK_TO_CHAR_TABLE` is a compile-time constant array of 256 `Option<char>`
//! values, indexed by VK code.  Indexing into it is an O(1) lookup, which
//! matters because the lookup runs inside the OS keyboard hook for every key.

/// `VK_RETURN`: the default barcode terminator.
pub const VK_RETURN: u32 = 0x0D;
/// `VK_TAB`: an alternative terminator some scanners are programmed to send.
pub const VK_TAB: u32 = 0x09;
/// `VK_OEM_PLUS`: the `= +` key.  Mapped to `'+'`.
pub const VK_OEM_PLUS: u32 = 0xBB;
/// `VK_OEM_MINUS`: the `- _` key.  Mapped to `'-'`.
pub const VK_OEM_MINUS: u32 = 0xBD;

/// Translates a Windows Virtual Key code to the barcode character it types.
///
/// Returns `None` for codes without a barcode character, including every
/// value above `0xFF` (VK codes are one byte wide).
pub fn vk_to_char(vk: u32) -> Option<char> {
    VK_TO_CHAR_TABLE.get(vk as usize).copied().flatten()
}

/// Complete VK → character table indexed by VK code (0x00–0xFF).
const VK_TO_CHAR_TABLE: [Option<char>; 256] = {
    let mut t: [Option<char>; 256] = [None; 256];

    // ── Digit row (VK_0=0x30 … VK_9=0x39) ───────────────────────────────────
    let mut vk = 0x30;
    while vk <= 0x39 {
        t[vk] = Some(vk as u8 as char);
        vk += 1;
    }

    // ── Numpad (VK_NUMPAD0=0x60 … VK_NUMPAD9=0x69) ───────────────────────────
    let mut vk = 0x60;
    while vk <= 0x69 {
        t[vk] = Some((b'0' + (vk - 0x60) as u8) as char);
        vk += 1;
    }

    // ── Alphabet keys (VK_A=0x41 … VK_Z=0x5A), always upper case ────────────
    let mut vk = 0x41;
    while vk <= 0x5A {
        t[vk] = Some(vk as u8 as char);
        vk += 1;
    }

    // ── Punctuation ───────────────────────────────────────────────────────────
    t[VK_OEM_MINUS as usize] = Some('-');
    t[VK_OEM_PLUS as usize] = Some('+');

    t
};
