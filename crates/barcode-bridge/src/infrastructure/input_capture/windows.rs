//! Windows low-level keyboard hook implementation.
//!
//! This module installs a `WH_KEYBOARD_LL` hook from the capture thread and
//! pumps that thread's Win32 message queue.  Low-level hook callbacks are
//! delivered *during* `GetMessageW` on the installing thread, so the callback
//! always runs on the same thread as the engine's classifier.
//!
//! # Callback storage
//!
//! A hook procedure is a bare `extern "system" fn` with no user-data pointer.
//! The callback for the current run is kept in a `thread_local!` slot on the
//! capture thread, so each run (and each engine) has its own state and a
//! stopped engine can be started again.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use barcode_core::KeyAction;
use tracing::{debug, error, warn};
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW,
    SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, HC_ACTION, HHOOK,
    KBDLLHOOKSTRUCT, MSG, PM_NOREMOVE, WH_KEYBOARD_LL, WM_KEYDOWN, WM_KEYUP, WM_QUIT, WM_USER,
};

use super::{
    CaptureError, GlobalKeyListener, KeyCallback, KeyNotification, ListenerHandle, LoopWaker,
};

thread_local! {
    /// Callback of the hook installed on this thread, if any.
    static HOOK_CALLBACK: RefCell<Option<KeyCallback>> = const { RefCell::new(None) };
}

/// Windows low-level keyboard capture.
#[derive(Debug, Default)]
pub struct WindowsKeyListener;

impl WindowsKeyListener {
    pub fn new() -> Self {
        Self
    }
}

/// Posts `WM_QUIT` to the capture thread so `GetMessageW` returns.
struct ThreadWaker {
    thread_id: u32,
}

impl LoopWaker for ThreadWaker {
    fn wake(&self) {
        // SAFETY: PostThreadMessageW only enqueues a message; an invalid or
        // exited thread id makes it fail, which is harmless here.
        let posted = unsafe { PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) };
        if let Err(e) = posted {
            debug!("could not post WM_QUIT to capture thread {}: {e}", self.thread_id);
        }
    }
}

impl GlobalKeyListener for WindowsKeyListener {
    fn install(&self, callback: KeyCallback) -> Result<ListenerHandle, CaptureError> {
        // SAFETY: PeekMessageW with PM_NOREMOVE forces creation of this
        // thread's message queue so PostThreadMessageW from `stop()` cannot
        // race ahead of the first GetMessageW call.
        unsafe {
            let mut msg = MSG::default();
            let _ = PeekMessageW(&mut msg, None, WM_USER, WM_USER, PM_NOREMOVE);
        }

        HOOK_CALLBACK.with(|slot| *slot.borrow_mut() = Some(callback));

        // SAFETY: The hook procedure is a valid `extern "system"` function for
        // the lifetime of the process, and this thread runs a message loop
        // (see `run`) for as long as the hook is installed.
        let hook = unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), None, 0) };

        match hook {
            Ok(hook) => {
                // SAFETY: GetCurrentThreadId has no preconditions.
                let thread_id = unsafe { GetCurrentThreadId() };
                Ok(ListenerHandle::new(
                    hook.0 as usize,
                    Arc::new(ThreadWaker { thread_id }),
                ))
            }
            Err(e) => {
                HOOK_CALLBACK.with(|slot| slot.borrow_mut().take());
                Err(CaptureError::HookInstallFailed(e.to_string()))
            }
        }
    }

    fn run(&self, _handle: &ListenerHandle, stop: &AtomicBool) {
        let mut msg = MSG::default();
        while !stop.load(Ordering::SeqCst) {
            // SAFETY: Standard Win32 GetMessage/DispatchMessage loop pattern.
            // GetMessageW returns 0 for WM_QUIT and -1 on error.
            let ret = unsafe { GetMessageW(&mut msg, None, 0, 0) };
            if ret.0 == 0 {
                break;
            }
            if ret.0 == -1 {
                warn!("GetMessageW failed; leaving capture loop");
                break;
            }
            // SAFETY: `msg` was filled in by a successful GetMessageW.
            unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }

    fn uninstall(&self, handle: ListenerHandle) {
        // SAFETY: `handle.raw()` is the HHOOK returned by SetWindowsHookExW in
        // `install`; consuming the handle guarantees it is unhooked only once.
        let result = unsafe { UnhookWindowsHookEx(HHOOK(handle.raw() as *mut _)) };
        if let Err(e) = result {
            warn!("UnhookWindowsHookEx failed: {e}");
        }
        HOOK_CALLBACK.with(|slot| slot.borrow_mut().take());
    }
}

/// Passes a notification to this thread's callback.
///
/// A panic must never unwind through the `extern "system"` frame, and the
/// event must still be forwarded, so panics are caught and logged here.
fn deliver(notification: KeyNotification) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        HOOK_CALLBACK.with(|slot| {
            // `try_borrow_mut` fails only on re-entry, in which case the
            // nested notification is forwarded without classification.
            if let Ok(mut guard) = slot.try_borrow_mut() {
                if let Some(callback) = guard.as_mut() {
                    callback(notification);
                }
            }
        })
    }));
    if result.is_err() {
        error!("keyboard hook callback panicked; event forwarded unchanged");
    }
}

/// Low-level keyboard hook callback.
///
/// # Safety
///
/// This function is called by Windows from the capture thread.
/// It must return quickly (< ~300ms) to avoid hook removal by the OS.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code == HC_ACTION as i32 {
        // SAFETY: l_param points to a KBDLLHOOKSTRUCT when n_code == HC_ACTION.
        let kbs = &*(l_param.0 as *const KBDLLHOOKSTRUCT);

        let action = match w_param.0 as u32 {
            WM_KEYDOWN => Some(KeyAction::Down),
            WM_KEYUP => Some(KeyAction::Up),
            // WM_SYSKEYDOWN / WM_SYSKEYUP (Alt held) are never part of a scan.
            _ => None,
        };

        if let Some(action) = action {
            deliver(KeyNotification {
                vk_code: kbs.vkCode,
                action,
            });
        }
    }

    // SAFETY: Every event, consumed or not, is forwarded to the next hook in
    // the chain; skipping this breaks other listeners system-wide.
    CallNextHookEx(None, n_code, w_param, l_param)
}
