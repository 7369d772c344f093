use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::pipeline::pipeline_state::CaptureState;

#[derive(Debug, Default)]
struct CaptureFlags {
    running: AtomicBool,
    stop_requested: AtomicBool,
    ticks: AtomicU64,
}

/// Cloneable control for a capture loop, usable from other tasks or threads.
#[derive(Debug, Clone, Default)]
pub struct CaptureHandle {
    flags: Arc<CaptureFlags>,
}

impl CaptureHandle {
    /// Requests a stop at the next tick boundary. The in-flight tick finishes.
    pub fn stop(&self) {
        if self.flags.running.load(Ordering::Acquire) {
            log::info!("Capture stop requested");
        }
        self.flags.stop_requested.store(true, Ordering::Release);
    }

    pub fn state(&self) -> CaptureState {
        if self.flags.running.load(Ordering::Acquire) {
            CaptureState::Running
        } else {
            CaptureState::Stopped
        }
    }

    pub fn is_stop_requested(&self) -> bool {
        self.flags.stop_requested.load(Ordering::Acquire)
    }

    /// Ticks completed by the current or most recent run.
    pub fn ticks(&self) -> u64 {
        self.flags.ticks.load(Ordering::Acquire)
    }
}

/// Tick bookkeeping for the continuous capture loop.
///
/// The owner drives the ticks; this type only tracks `Stopped -> Running ->
/// Stopped` and the cooperative stop flag.
#[derive(Debug, Default)]
pub struct CaptureLoop {
    handle: CaptureHandle,
    max_ticks: Option<u64>,
}

impl CaptureLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_max_ticks(&mut self, max_ticks: Option<u64>) {
        self.max_ticks = max_ticks;
    }

    pub fn handle(&self) -> CaptureHandle {
        self.handle.clone()
    }

    pub fn state(&self) -> CaptureState {
        self.handle.state()
    }

    /// `Stopped -> Running`. Returns `false`, changing nothing, if already
    /// running. Resets the tick count; a stop requested before the start is
    /// observed at the first tick boundary.
    pub fn start(&self) -> bool {
        let flags = &self.handle.flags;
        if flags
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("Capture loop already running");
            return false;
        }
        flags.ticks.store(0, Ordering::Release);
        log::info!("Capture loop started");
        true
    }

    /// Drops a pending stop request, e.g. when a new stream is negotiated.
    pub fn clear_stop(&self) {
        self.handle
            .flags
            .stop_requested
            .store(false, Ordering::Release);
    }

    /// Checked at each tick boundary.
    pub fn should_continue(&self) -> bool {
        if self.handle.is_stop_requested() {
            return false;
        }
        match self.max_ticks {
            Some(limit) => self.handle.ticks() < limit,
            None => true,
        }
    }

    pub fn complete_tick(&self) -> u64 {
        self.handle.flags.ticks.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// `Running -> Stopped`. Consumes the stop request.
    pub fn finish(&self) {
        self.clear_stop();
        if self.handle.flags.running.swap(false, Ordering::AcqRel) {
            log::info!("Capture loop stopped after {} tick(s)", self.handle.ticks());
        }
    }
}
