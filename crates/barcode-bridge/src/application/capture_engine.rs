//! CaptureEngine: turns system-wide key presses into barcodes.
//!
//! The engine owns one dedicated thread (`barcode-hook-loop`) per run.  That
//! thread installs the [`GlobalKeyListener`], runs its blocking message loop,
//! and classifies every key notification synchronously inside the listener
//! callback.  Completed barcodes leave the thread through a [`BarcodeSink`].
//!
//! # Threading model
//!
//! The [`ScanClassifier`] is moved into the listener callback, so only the
//! capture thread can reach it and no lock is needed on the hot path.  Other
//! threads interact with a run only through its stop flag and its
//! [`LoopWaker`].
//!
//! ```text
//! OS hook ──► callback (capture thread) ──► ScanClassifier ──► BarcodeSink
//!                                                               │ try_send
//!                                                               ▼
//!                                                     consumer (tokio task)
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use barcode_core::{Barcode, KeyEvent, KeyOutcome, ScanClassifier, ScannerConfig};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::infrastructure::input_capture::{
    CaptureError, GlobalKeyListener, KeyCallback, KeyNotification, LoopWaker,
};

/// Error returned when a completed barcode cannot be handed to its consumer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("barcode consumer unavailable: {0}")]
    Unavailable(String),
}

/// Receives completed barcodes from the capture thread.
///
/// `deliver` is called from inside the OS keyboard hook and MUST NOT block:
/// implementations either enqueue the barcode immediately or fail with
/// [`SinkError::Unavailable`], in which case that barcode is dropped.
pub trait BarcodeSink: Send + Sync {
    fn deliver(&self, barcode: Barcode) -> Result<(), SinkError>;
}

/// State of a started capture run.
struct CaptureLoop {
    stop: Arc<AtomicBool>,
    waker: Arc<dyn LoopWaker>,
    thread: JoinHandle<()>,
}

impl CaptureLoop {
    fn is_current_thread(&self) -> bool {
        self.thread.thread().id() == thread::current().id()
    }
}

/// The input capture engine.
pub struct CaptureEngine {
    listener: Arc<dyn GlobalKeyListener>,
    config: ScannerConfig,
    sink: Arc<dyn BarcodeSink>,
    active: Mutex<Option<CaptureLoop>>,
}

impl CaptureEngine {
    /// Creates a stopped engine.
    pub fn new(
        listener: Arc<dyn GlobalKeyListener>,
        config: ScannerConfig,
        sink: Arc<dyn BarcodeSink>,
    ) -> Self {
        Self {
            listener,
            config,
            sink,
            active: Mutex::new(None),
        }
    }

    /// The classifier settings used by every run of this engine.
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Starts capturing.  A no-op while a run is already active.
    ///
    /// Blocks only until the capture thread reports whether the hook was
    /// installed.  On failure the error is logged once, the thread has
    /// already exited, and the engine stays stopped; nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] when the thread cannot be spawned or the OS
    /// refuses the hook.
    pub fn start(&self) -> Result<(), CaptureError> {
        let mut active = self.lock_active();

        if let Some(run) = active.as_ref() {
            if run.is_current_thread() {
                return Ok(());
            }
            if !run.thread.is_finished() && !run.stop.load(Ordering::SeqCst) {
                return Ok(());
            }
        }
        // The previous loop ended on its own or is still winding down after
        // a `stop` from inside the callback; wait for its hook to be released.
        if let Some(stale) = active.take() {
            drop(active);
            if stale.thread.join().is_err() {
                error!("previous capture thread panicked");
            }
            active = self.lock_active();
            if active.is_some() {
                return Ok(());
            }
        }

        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();

        let listener = Arc::clone(&self.listener);
        let sink = Arc::clone(&self.sink);
        let config = self.config;
        let thread_stop = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name("barcode-hook-loop".to_string())
            .spawn(move || run_capture_thread(listener, config, sink, thread_stop, ready_tx))
            .map_err(|e| {
                let e = CaptureError::ThreadSpawn(e.to_string());
                error!("barcode capture disabled: {e}");
                e
            })?;

        match ready_rx.recv() {
            Ok(Ok(waker)) => {
                info!(
                    max_key_interval_ms = self.config.max_key_interval.as_millis() as u64,
                    terminator_vk = self.config.terminator_vk,
                    "global keyboard hook active"
                );
                *active = Some(CaptureLoop {
                    stop,
                    waker,
                    thread,
                });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                error!("barcode capture disabled: {e}");
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                let e = CaptureError::HookInstallFailed(
                    "capture thread exited before reporting hook status".to_string(),
                );
                error!("barcode capture disabled: {e}");
                Err(e)
            }
        }
    }

    /// Stops capturing and releases the hook.
    ///
    /// Safe to call from any thread, any number of times, and when the
    /// engine was never started or failed to start.
    ///
    /// Called from inside a [`BarcodeSink`], `stop` only signals the loop:
    /// the hook is released once the callback returns, and until then
    /// [`is_running`](Self::is_running) keeps reporting `true`.  `start`
    /// from inside a sink is a no-op.
    pub fn stop(&self) {
        let mut active = self.lock_active();
        let Some(run) = active.as_ref() else {
            return;
        };

        run.stop.store(true, Ordering::SeqCst);
        run.waker.wake();

        if run.is_current_thread() {
            // The next `start` joins this thread before installing again.
            return;
        }
        let Some(run) = active.take() else {
            return;
        };
        drop(active);
        if run.thread.join().is_err() {
            error!("capture thread panicked");
        }
        info!("global keyboard hook released");
    }

    /// Whether a capture thread is running with its hook installed.
    pub fn is_running(&self) -> bool {
        self.lock_active()
            .as_ref()
            .is_some_and(|run| !run.thread.is_finished())
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<CaptureLoop>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for CaptureEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Entry point of the capture thread.
fn run_capture_thread(
    listener: Arc<dyn GlobalKeyListener>,
    config: ScannerConfig,
    sink: Arc<dyn BarcodeSink>,
    stop: Arc<AtomicBool>,
    ready: mpsc::Sender<Result<Arc<dyn LoopWaker>, CaptureError>>,
) {
    let mut classifier = ScanClassifier::new(config);

    let callback: KeyCallback = Box::new(move |notification: KeyNotification| {
        let event = KeyEvent {
            vk_code: notification.vk_code,
            action: notification.action,
            at: Instant::now(),
        };
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            classify_and_emit(&mut classifier, sink.as_ref(), event)
        }));
        if result.is_err() {
            error!("barcode classification panicked; pending sequence discarded");
            classifier.reset();
        }
    });

    let handle = match listener.install(callback) {
        Ok(handle) => handle,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    if ready.send(Ok(handle.waker())).is_err() {
        listener.uninstall(handle);
        return;
    }

    listener.run(&handle, &stop);
    listener.uninstall(handle);
}

fn classify_and_emit(classifier: &mut ScanClassifier, sink: &dyn BarcodeSink, event: KeyEvent) {
    if let KeyOutcome::Completed(barcode) = classifier.process(event) {
        info!(barcode = %barcode, "barcode scanned");
        if let Err(e) = sink.deliver(barcode) {
            warn!("barcode dropped: {e}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
