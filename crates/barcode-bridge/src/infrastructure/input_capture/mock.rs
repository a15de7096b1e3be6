//! Mock keyboard listener for unit and integration testing.
//!
//! Acts as a fake OS event source: tests inject [`KeyNotification`]s from
//! their own thread, and the capture thread's [`GlobalKeyListener::run`] loop
//! receives them through a channel and invokes the engine callback, exactly
//! like the Win32 message loop does for real hooks.
//!
//! The mock also counts installs, uninstalls and forwarded notifications so
//! tests can assert the hook lifecycle and the forward-every-event rule.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::{
    CaptureError, GlobalKeyListener, KeyCallback, KeyNotification, ListenerHandle, LoopWaker,
};

enum MockMessage {
    Key(KeyNotification),
    Wake,
}

#[derive(Default)]
struct MockState {
    /// Present while a hook is installed.
    sender: Option<Sender<MockMessage>>,
    receiver: Option<Receiver<MockMessage>>,
    callback: Option<KeyCallback>,
    fail_install: bool,
    installs: u32,
    uninstalls: u32,
    forwarded: u64,
    next_handle: usize,
}

/// A mock implementation of [`GlobalKeyListener`] that allows tests to inject events.
#[derive(Clone, Default)]
pub struct MockKeyListener {
    state: Arc<Mutex<MockState>>,
}

struct ChannelWaker(Sender<MockMessage>);

impl LoopWaker for ChannelWaker {
    fn wake(&self) {
        // Ignore send errors (loop already gone).
        let _ = self.0.send(MockMessage::Wake);
    }
}

impl MockKeyListener {
    /// Creates a mock whose installs succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock whose installs fail, as if the OS refused the hook.
    pub fn failing() -> Self {
        let mock = Self::default();
        mock.lock().fail_install = true;
        mock
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("lock poisoned")
    }

    /// Injects a synthetic notification, as if typed on the keyboard.
    ///
    /// Panics if no hook is currently installed.
    pub fn inject(&self, notification: KeyNotification) {
        let guard = self.lock();
        let sender = guard
            .sender
            .as_ref()
            .expect("MockKeyListener::inject called while no hook is installed");
        sender
            .send(MockMessage::Key(notification))
            .expect("capture loop receiver has been dropped");
    }

    /// Injects a key-down followed by a key-up for every code in `vk_codes`.
    pub fn type_keys(&self, vk_codes: &[u32]) {
        for &vk in vk_codes {
            self.inject(KeyNotification::down(vk));
            self.inject(KeyNotification::up(vk));
        }
    }

    /// Whether a hook is currently installed.
    pub fn is_installed(&self) -> bool {
        self.lock().sender.is_some()
    }

    pub fn install_count(&self) -> u32 {
        self.lock().installs
    }

    pub fn uninstall_count(&self) -> u32 {
        self.lock().uninstalls
    }

    /// Number of notifications passed on after the callback returned.
    pub fn forwarded_count(&self) -> u64 {
        self.lock().forwarded
    }

    /// Polls until at least `count` notifications have been forwarded.
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub fn wait_for_forwarded(&self, count: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.forwarded_count() >= count {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        self.forwarded_count() >= count
    }
}

impl GlobalKeyListener for MockKeyListener {
    fn install(&self, callback: KeyCallback) -> Result<ListenerHandle, CaptureError> {
        let mut state = self.lock();
        if state.fail_install {
            return Err(CaptureError::HookInstallFailed(
                "mock listener configured to fail".to_string(),
            ));
        }
        let (tx, rx) = mpsc::channel();
        let waker = Arc::new(ChannelWaker(tx.clone()));
        state.sender = Some(tx);
        state.receiver = Some(rx);
        state.callback = Some(callback);
        state.installs += 1;
        state.next_handle += 1;
        Ok(ListenerHandle::new(state.next_handle, waker))
    }

    fn run(&self, _handle: &ListenerHandle, stop: &AtomicBool) {
        // Take the receiver and callback out so the lock is not held while
        // blocking or while the callback runs.
        let (rx, mut callback) = {
            let mut state = self.lock();
            match (state.receiver.take(), state.callback.take()) {
                (Some(rx), Some(cb)) => (rx, cb),
                _ => return,
            }
        };

        while !stop.load(Ordering::SeqCst) {
            match rx.recv() {
                Ok(MockMessage::Key(notification)) => {
                    callback(notification);
                    self.lock().forwarded += 1;
                }
                Ok(MockMessage::Wake) => {}
                Err(_) => break,
            }
        }
    }

    fn uninstall(&self, _handle: ListenerHandle) {
        let mut state = self.lock();
        state.sender = None;
        state.receiver = None;
        state.callback = None;
        state.uninstalls += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_mock_listener_delivers_injected_events_to_callback() {
        // Arrange
        let listener = MockKeyListener::new();
        let (seen_tx, seen_rx) = mpsc::channel();
        let handle = listener
            .install(Box::new(move |n| {
                let _ = seen_tx.send(n);
            }))
            .expect("install should succeed");
        let stop = Arc::new(AtomicBool::new(false));
        let waker = handle.waker();

        let loop_listener = listener.clone();
        let loop_stop = Arc::clone(&stop);
        let worker = thread::spawn(move || {
            loop_listener.run(&handle, &loop_stop);
            loop_listener.uninstall(handle);
        });

        // Act
        listener.inject(KeyNotification::down(0x41));

        // Assert
        let seen = seen_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("callback should receive the event");
        assert_eq!(seen, KeyNotification::down(0x41));
        assert!(listener.wait_for_forwarded(1, Duration::from_secs(2)));

        stop.store(true, Ordering::SeqCst);
        waker.wake();
        worker.join().expect("loop thread should exit cleanly");
        assert_eq!(listener.uninstall_count(), 1);
        assert!(!listener.is_installed());
    }

    #[test]
    fn test_failing_mock_refuses_install() {
        let listener = MockKeyListener::failing();
        let result = listener.install(Box::new(|_| {}));
        assert!(matches!(result, Err(CaptureError::HookInstallFailed(_))));
        assert_eq!(listener.install_count(), 0);
        assert!(!listener.is_installed());
    }

    #[test]
    fn test_run_returns_immediately_when_stop_already_set() {
        let listener = MockKeyListener::new();
        let handle = listener.install(Box::new(|_| {})).unwrap();
        let stop = AtomicBool::new(true);
        listener.run(&handle, &stop);
        listener.uninstall(handle);
        assert_eq!(listener.forwarded_count(), 0);
    }

    #[test]
    #[should_panic(expected = "no hook is installed")]
    fn test_inject_before_install_panics() {
        MockKeyListener::new().inject(KeyNotification::down(0x31));
    }
}
