//! The classifier state machine.

use std::time::Instant;

use tracing::{debug, trace};

use super::{Barcode, KeyAction, KeyEvent, ScannerConfig};
use crate::keymap::vk_to_char;

/// What the classifier did with one key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Key-up, unmapped key, lone terminator, or a character dropped while
    /// an overflowed scan is being skipped.
    Ignored,
    /// The character was appended to the pending sequence.
    Accepted(char),
    /// The terminator completed a barcode.  The pending sequence is now empty.
    Completed(Barcode),
    /// The pending sequence hit `max_length` and was discarded.  Characters
    /// are dropped until the next terminator or timeout gap.
    Overflowed,
}

/// Characters accepted so far for the scan in progress.
///
/// Every character was accepted within the configured interval of its
/// predecessor.
#[derive(Debug, Default)]
struct PendingSequence {
    chars: String,
    /// Arrival time of the most recent key-down, whether or not it produced
    /// a character.
    last_accepted: Option<Instant>,
    /// Set when the sequence overflowed; cleared by a terminator or a gap.
    overflowed: bool,
}

impl PendingSequence {
    fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    fn clear(&mut self) {
        self.chars.clear();
        self.overflowed = false;
    }

    fn take(&mut self) -> Barcode {
        Barcode::from(std::mem::take(&mut self.chars))
    }
}

/// Classifies timestamped key events into barcodes.
///
/// One classifier is owned by exactly one capture thread and performs no
/// locking.  Every call to [`process`] is O(1)
/// apart from the final snapshot copy on completion.
///
/// [`process`]: ScanClassifier::process
#[derive(Debug)]
pub struct ScanClassifier {
    config: ScannerConfig,
    pending: PendingSequence,
    discarded: u64,
}

impl ScanClassifier {
    /// Creates a classifier with an empty pending sequence.
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            config,
            pending: PendingSequence::default(),
            discarded: 0,
        }
    }

    /// Returns the configuration this classifier was built with.
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Number of characters currently pending.
    pub fn pending_len(&self) -> usize {
        self.pending.chars.len()
    }

    /// Number of partial sequences thrown away by timeout or overflow.
    pub fn discarded_count(&self) -> u64 {
        self.discarded
    }

    /// Feeds one key event through the classifier.
    ///
    /// Key-up events never change state.  For key-down events the timeout
    /// check runs first, then the arrival time becomes the new reference,
    /// then the key is either treated as the terminator or mapped and
    /// appended.
    pub fn process(&mut self, event: KeyEvent) -> KeyOutcome {
        if event.action == KeyAction::Up {
            return KeyOutcome::Ignored;
        }

        self.expire_if_stale(event.at);
        self.pending.last_accepted = Some(event.at);

        if event.vk_code == self.config.terminator_vk {
            return self.complete();
        }

        let Some(ch) = vk_to_char(event.vk_code) else {
            trace!(vk = event.vk_code, "unmapped key ignored");
            return KeyOutcome::Ignored;
        };

        if self.pending.overflowed {
            return KeyOutcome::Ignored;
        }

        if self.pending.chars.len() >= self.config.max_length {
            debug!(
                max_length = self.config.max_length,
                "pending sequence exceeded maximum length; discarding scan"
            );
            self.pending.clear();
            self.pending.overflowed = true;
            self.discarded += 1;
            return KeyOutcome::Overflowed;
        }

        self.pending.chars.push(ch);
        KeyOutcome::Accepted(ch)
    }

    /// Discards all pending characters without emitting them.
    pub fn reset(&mut self) {
        self.pending = PendingSequence::default();
    }

    fn expire_if_stale(&mut self, now: Instant) {
        let Some(last) = self.pending.last_accepted else {
            return;
        };
        let gap = now.saturating_duration_since(last);
        if gap <= self.config.max_key_interval {
            return;
        }
        if !self.pending.is_empty() {
            debug!(
                gap_ms = gap.as_millis() as u64,
                discarded = self.pending.chars.len(),
                "key gap exceeded scanner interval; discarding pending sequence"
            );
            self.discarded += 1;
        }
        self.pending.clear();
    }

    fn complete(&mut self) -> KeyOutcome {
        if self.pending.overflowed {
            self.pending.overflowed = false;
            return KeyOutcome::Ignored;
        }
        if self.pending.is_empty() {
            return KeyOutcome::Ignored;
        }
        KeyOutcome::Completed(self.pending.take())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
