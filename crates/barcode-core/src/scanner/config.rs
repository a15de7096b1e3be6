//! Classifier configuration.

use std::time::Duration;

use thiserror::Error;

use crate::keymap::VK_RETURN;

/// Largest gap between two keys that still counts as scanner input.
pub const DEFAULT_MAX_KEY_INTERVAL: Duration = Duration::from_millis(100);

/// Longest barcode accepted before the pending sequence is discarded.
pub const DEFAULT_MAX_LENGTH: usize = 256;

/// Errors returned by [`ScannerConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScannerConfigError {
    #[error("max key interval must be greater than zero")]
    ZeroInterval,
    #[error("max barcode length must be greater than zero")]
    ZeroLength,
    /// The terminator would also be typed as a barcode character.
    #[error("terminator VK 0x{0:02X} maps to a barcode character")]
    TerminatorIsCharacter(u32),
}

/// Immutable classifier settings, fixed for the lifetime of one engine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannerConfig {
    /// Gaps strictly greater than this reset the pending sequence.
    pub max_key_interval: Duration,
    /// VK code that ends a barcode.  Defaults to `VK_RETURN`.
    pub terminator_vk: u32,
    /// Maximum number of characters in one barcode.
    pub max_length: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_key_interval: DEFAULT_MAX_KEY_INTERVAL,
            terminator_vk: VK_RETURN,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl ScannerConfig {
    /// Checks the settings for values that would make the classifier useless.
    ///
    /// # Errors
    ///
    /// Returns a [`ScannerConfigError`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), ScannerConfigError> {
        if self.max_key_interval.is_zero() {
            return Err(ScannerConfigError::ZeroInterval);
        }
        if self.max_length == 0 {
            return Err(ScannerConfigError::ZeroLength);
        }
        if crate::keymap::vk_to_char(self.terminator_vk).is_some() {
            return Err(ScannerConfigError::TerminatorIsCharacter(self.terminator_vk));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_100ms_and_enter() {
        let cfg = ScannerConfig::default();
        assert_eq!(cfg.max_key_interval, Duration::from_millis(100));
        assert_eq!(cfg.terminator_vk, 0x0D);
        assert_eq!(cfg.max_length, 256);
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let cfg = ScannerConfig {
            max_key_interval: Duration::ZERO,
            ..ScannerConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ScannerConfigError::ZeroInterval));
    }

    #[test]
    fn test_validate_rejects_zero_length() {
        let cfg = ScannerConfig {
            max_length: 0,
            ..ScannerConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ScannerConfigError::ZeroLength));
    }

    #[test]
    fn test_validate_rejects_printable_terminator() {
        let cfg = ScannerConfig {
            terminator_vk: 0x41,
            ..ScannerConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ScannerConfigError::TerminatorIsCharacter(0x41))
        );
    }
}
