//! Capture session: owns the frame source and polls it on a worker thread.
//!
//! Ticks never overlap. The worker runs one detection tick, then waits out
//! the rest of the poll interval on the stop channel, so a slow recognition
//! call delays the next tick instead of running beside it.
//!
//! `stop()` raises a cancellation flag before signalling the worker. A tick
//! that is still running finishes its recognition calls, but the flag is
//! checked right before commit and its result is dropped.
//!
//! A tick that panics is logged and counted as failed; polling carries on.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::state::SessionState;
use crate::capture::FrameSource;
use crate::catalog::Zone;
use crate::config::CaptureConfig;
use crate::detection::{
    DetectionCandidate, DetectionCycle, PreviewSurface, ResultSink, TickOutcome,
};
use crate::error::CaptureError;
use crate::ocr::Recognition;

/// Everything the worker thread borrows for the length of a session.
struct SessionParts {
    source: Box<dyn FrameSource>,
    sink: Box<dyn ResultSink>,
    preview: Option<Box<dyn PreviewSurface>>,
    cycle: Option<DetectionCycle>,
}

struct Worker {
    stop_tx: Sender<()>,
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<SessionParts>,
}

pub struct CaptureSession {
    config: CaptureConfig,
    zones: Vec<Zone>,
    recognition: Recognition,
    parts: Option<SessionParts>,
    worker: Option<Worker>,
    debug: Arc<AtomicBool>,
    last_detection: Arc<Mutex<Option<DetectionCandidate>>>,
}

impl CaptureSession {
    /// Builds an idle session.
    ///
    /// When recognition is absent the session is still constructed; the
    /// reason is logged here once and every `start()` reports
    /// `CapabilityAbsent` without touching the frame source.
    pub fn new(
        config: CaptureConfig,
        zones: Vec<Zone>,
        recognition: Recognition,
        source: Box<dyn FrameSource>,
        sink: Box<dyn ResultSink>,
    ) -> Self {
        if let Recognition::Absent { reason } = &recognition {
            crate::log(&format!(
                "Text recognition unavailable, detection disabled: {}",
                reason
            ));
        }

        Self {
            config,
            zones,
            recognition,
            parts: Some(SessionParts {
                source,
                sink,
                preview: None,
                cycle: None,
            }),
            worker: None,
            debug: Arc::new(AtomicBool::new(false)),
            last_detection: Arc::new(Mutex::new(None)),
        }
    }

    /// Sets the surface intermediate crops are shown on. Only takes effect
    /// before the first `start()`.
    pub fn with_preview(mut self, preview: Box<dyn PreviewSurface>) -> Self {
        if let Some(parts) = self.parts.as_mut() {
            parts.preview = Some(preview);
        }
        self
    }

    pub fn state(&self) -> SessionState {
        if self.worker.is_some() {
            SessionState::Capturing
        } else {
            SessionState::Idle
        }
    }

    /// Toggles the debug previews; applies from the next tick.
    pub fn set_debug(&self, enabled: bool) {
        self.debug.store(enabled, Ordering::SeqCst);
    }

    pub fn last_detection(&self) -> Option<DetectionCandidate> {
        self.last_detection
            .lock()
            .ok()
            .and_then(|last| last.clone())
    }

    /// Summary of the last committed road, or the session state before the first one.
    pub fn status_line(&self) -> String {
        self.last_detection()
            .map(|c| c.status_line())
            .unwrap_or_else(|| self.state().status_text().to_string())
    }

    /// Opens the frame source and starts polling.
    ///
    /// Does nothing while already capturing. On any error the session stays idle.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.worker.is_some() {
            return Ok(());
        }

        let recognizer = self.recognition.recognizer()?;
        let mut parts = self.parts.take().ok_or_else(|| {
            CaptureError::DeviceUnavailable("frame source was lost by a failed session".into())
        })?;

        if let Err(e) = parts.source.open() {
            crate::log(&format!("Failed to open frame source: {}", e));
            self.parts = Some(parts);
            return Err(e);
        }

        let mut cycle = match parts.cycle.take() {
            Some(cycle) => cycle,
            None => {
                match DetectionCycle::new(self.config.clone(), self.zones.clone(), recognizer) {
                    Ok(cycle) => {
                        let cycle = cycle.with_debug(Arc::clone(&self.debug));
                        match parts.preview.take() {
                            Some(preview) => cycle.with_preview(preview),
                            None => cycle,
                        }
                    }
                    Err(e) => {
                        parts.source.close();
                        self.parts = Some(parts);
                        return Err(e);
                    }
                }
            }
        };

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let cancelled = Arc::new(AtomicBool::new(false));
        let worker_cancelled = Arc::clone(&cancelled);
        let last_detection = Arc::clone(&self.last_detection);
        let interval = Duration::from_millis(self.config.poll_interval_ms);

        let handle = thread::spawn(move || {
            crate::log("Capture worker started");

            loop {
                let tick_start = Instant::now();

                let tick = panic::catch_unwind(AssertUnwindSafe(|| {
                    match parts.source.next_frame() {
                        Ok(frame) => {
                            Some(cycle.run_tick(&frame, parts.sink.as_mut(), &worker_cancelled))
                        }
                        Err(e) => {
                            crate::log(&format!("Failed to grab frame: {:#}", e));
                            None
                        }
                    }
                }));
                let outcome = tick.unwrap_or_else(|payload| {
                    let reason = panic_message(payload.as_ref());
                    crate::log(&format!("Detection tick panicked: {}", reason));
                    Some(TickOutcome::Failed(reason))
                });

                if let Some(TickOutcome::Committed(candidate)) = outcome {
                    if let Ok(mut last) = last_detection.lock() {
                        *last = Some(candidate);
                    }
                }

                let wait = interval.saturating_sub(tick_start.elapsed());
                match stop_rx.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    // Stop requested, or the session was dropped
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }

            crate::log("Capture worker finished");
            parts.cycle = Some(cycle);
            parts
        });

        self.worker = Some(Worker {
            stop_tx,
            cancelled,
            handle,
        });
        crate::log(&format!(
            "Capture started (every {} ms)",
            self.config.poll_interval_ms
        ));
        Ok(())
    }

    /// Stops polling and releases the frame source. Does nothing while idle.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        worker.cancelled.store(true, Ordering::SeqCst);
        let _ = worker.stop_tx.send(());

        match worker.handle.join() {
            Ok(mut parts) => {
                parts.source.close();
                self.parts = Some(parts);
                crate::log("Capture stopped");
            }
            Err(_) => crate::log("Capture worker panicked; frame source lost"),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}
