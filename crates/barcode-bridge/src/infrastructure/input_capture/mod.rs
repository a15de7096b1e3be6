//! Input capture infrastructure for the bridge.
//!
//! On Windows, this installs a low-level keyboard hook (`WH_KEYBOARD_LL`) on a
//! dedicated Win32 message-loop thread.  The hook sees every key press on the
//! desktop, whichever window has focus, which is what lets a scanner be used
//! without first clicking into the bridge.
//!
//! # Windows-Specific Implementation
//!
//! The hook callback must complete within ~300ms or Windows will silently
//! remove the hook, and while it runs *all* keyboard input on the machine is
//! held up.  The callback therefore only classifies the key (a table lookup
//! and a string push) and hands completed barcodes off through a channel.
//!
//! # Testability
//!
//! The [`GlobalKeyListener`] trait is the only seam between the capture
//! engine and the OS.  Unit tests drive the engine through
//! [`mock::MockKeyListener`] instead of real hooks.
//!
//! # Lifecycle of one capture run
//!
//! ```text
//! capture thread                         any thread
//! ──────────────                         ──────────
//! install(callback) → ListenerHandle
//! run(&handle, &stop)   ◄── blocks ──    stop.store(true)
//!   dispatches notifications             handle.waker().wake()
//!   returns once stop is observed
//! uninstall(handle)
//! ```

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use barcode_core::KeyAction;

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// A raw key notification as delivered by the OS hook.
///
/// Carries no timestamp: the capture engine reads the monotonic clock when the
/// notification reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyNotification {
    /// Windows Virtual Key code.
    pub vk_code: u32,
    pub action: KeyAction,
}

impl KeyNotification {
    pub fn down(vk_code: u32) -> Self {
        Self {
            vk_code,
            action: KeyAction::Down,
        }
    }

    pub fn up(vk_code: u32) -> Self {
        Self {
            vk_code,
            action: KeyAction::Up,
        }
    }
}

/// Callback invoked on the capture thread for every key notification.
pub type KeyCallback = Box<dyn FnMut(KeyNotification) + Send + 'static>;

/// Interrupts a blocked [`GlobalKeyListener::run`] from another thread.
pub trait LoopWaker: Send + Sync {
    fn wake(&self);
}

/// An installed interception point.
///
/// `raw` is the opaque OS handle value (an `HHOOK` on Windows).  The handle is
/// consumed by [`GlobalKeyListener::uninstall`], so it can only be released once.
pub struct ListenerHandle {
    raw: usize,
    waker: Arc<dyn LoopWaker>,
}

impl ListenerHandle {
    pub fn new(raw: usize, waker: Arc<dyn LoopWaker>) -> Self {
        Self { raw, waker }
    }

    /// The OS handle value.
    pub fn raw(&self) -> usize {
        self.raw
    }

    /// A waker that may be moved to, and fired from, any thread.
    pub fn waker(&self) -> Arc<dyn LoopWaker> {
        Arc::clone(&self.waker)
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("raw", &format_args!("0x{:X}", self.raw))
            .finish_non_exhaustive()
    }
}

/// Error type for input capture operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to install keyboard hook: {0}")]
    HookInstallFailed(String),
    #[error("platform not supported: {0}")]
    UnsupportedPlatform(String),
    #[error("failed to spawn capture thread: {0}")]
    ThreadSpawn(String),
}

/// Capability to intercept keyboard input system-wide.
///
/// All three methods are called on the same dedicated capture thread, in the
/// order `install` → `run` → `uninstall`.  Implementations MUST pass every
/// intercepted event on to the next handler in the OS chain after invoking
/// the callback, whether or not the callback used it.
pub trait GlobalKeyListener: Send + Sync + 'static {
    /// Registers the interception point on the calling thread.
    fn install(&self, callback: KeyCallback) -> Result<ListenerHandle, CaptureError>;

    /// Retrieves and dispatches notifications until `stop` is observed set.
    ///
    /// `stop` is checked after every dispatched message.  The handle's waker
    /// unblocks a pending retrieval so the flag is seen promptly.
    fn run(&self, handle: &ListenerHandle, stop: &AtomicBool);

    /// Releases the interception point.
    fn uninstall(&self, handle: ListenerHandle);
}

/// Listener used on platforms without a global keyboard hook implementation.
///
/// Installation always fails, which disables capture for the session without
/// affecting the rest of the application.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedKeyListener;

impl GlobalKeyListener for UnsupportedKeyListener {
    fn install(&self, _callback: KeyCallback) -> Result<ListenerHandle, CaptureError> {
        Err(CaptureError::UnsupportedPlatform(format!(
            "no global keyboard hook available on {}",
            std::env::consts::OS
        )))
    }

    fn run(&self, _handle: &ListenerHandle, _stop: &AtomicBool) {}

    fn uninstall(&self, _handle: ListenerHandle) {}
}

/// Returns the listener for the platform this binary was compiled for.
pub fn platform_listener() -> Arc<dyn GlobalKeyListener> {
    #[cfg(target_os = "windows")]
    {
        Arc::new(windows::WindowsKeyListener::new())
    }

    #[cfg(not(target_os = "windows"))]
    {
        Arc::new(UnsupportedKeyListener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_listener_install_fails_with_platform_name() {
        let listener = UnsupportedKeyListener;
        let err = listener
            .install(Box::new(|_| {}))
            .expect_err("install must fail");
        match err {
            CaptureError::UnsupportedPlatform(msg) => {
                assert!(msg.contains(std::env::consts::OS), "got: {msg}")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_key_notification_constructors() {
        assert_eq!(KeyNotification::down(0x41).action, KeyAction::Down);
        assert_eq!(KeyNotification::up(0x41).action, KeyAction::Up);
    }

    #[test]
    fn test_listener_handle_debug_shows_raw_value_in_hex() {
        struct NoopWaker;
        impl LoopWaker for NoopWaker {
            fn wake(&self) {}
        }
        let handle = ListenerHandle::new(0xBEEF, Arc::new(NoopWaker));
        assert!(format!("{handle:?}").contains("0xBEEF"));
    }
}
