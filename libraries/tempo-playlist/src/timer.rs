//! Simulated playback wait
//!
//! Playing a song means holding the calling thread for the song's duration.
//! The wait sits behind a trait so tests run without real delays and so
//! another thread can cut a wait short.

use crate::types::WaitOutcome;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Timed wait used while a song "plays"
///
/// Implementors block for (at most) the given duration. A wait that ends
/// early reports [`WaitOutcome::Cancelled`]; the playlist has already moved
/// its cursor by then, so cancelling never leaves the cursor dangling.
pub trait PlaybackTimer: Send {
    /// Block for the song's duration or until cancelled
    fn wait(&self, duration: Duration) -> WaitOutcome;
}

/// Timer that returns immediately
///
/// Used by tests and scripted runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantTimer;

impl PlaybackTimer for InstantTimer {
    fn wait(&self, _duration: Duration) -> WaitOutcome {
        WaitOutcome::Completed
    }
}

/// Wall-clock timer with cancellation
///
/// The wait is a `recv_timeout` on a channel; [`CancelHandle::cancel`] sends
/// on that channel and wakes the waiting thread.
#[derive(Debug)]
pub struct SleepTimer {
    cancel_tx: Sender<()>,
    cancel_rx: Receiver<()>,
    waiting: Arc<AtomicBool>,
    time_scale: f64,
}

/// Cloneable handle that interrupts a [`SleepTimer`] wait
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Sender<()>,
    waiting: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Interrupt the wait in progress
    ///
    /// Returns `false` when the timer was idle. A cancel sent while idle is
    /// discarded by the next wait.
    pub fn cancel(&self) -> bool {
        if !self.is_waiting() {
            return false;
        }
        // Receiver lives as long as the timer; a send error means it is gone
        self.tx.send(()).is_ok()
    }

    /// Whether the timer is blocked in a wait right now
    pub fn is_waiting(&self) -> bool {
        self.waiting.load(Ordering::SeqCst)
    }
}

impl SleepTimer {
    /// Create a timer that waits the real song duration
    pub fn new() -> Self {
        Self::with_time_scale(1.0)
    }

    /// Create a timer that waits `duration * time_scale`
    ///
    /// `0.0` turns every wait into a no-op. Negative or non-finite scales
    /// fall back to `1.0`.
    pub fn with_time_scale(time_scale: f64) -> Self {
        let (cancel_tx, cancel_rx) = unbounded();
        let time_scale = if time_scale.is_finite() && time_scale >= 0.0 {
            time_scale
        } else {
            1.0
        };

        Self {
            cancel_tx,
            cancel_rx,
            waiting: Arc::new(AtomicBool::new(false)),
            time_scale,
        }
    }

    /// Handle for cancelling waits from another thread
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: self.cancel_tx.clone(),
            waiting: Arc::clone(&self.waiting),
        }
    }

    /// Time scale applied to every wait
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    fn scaled(&self, duration: Duration) -> Duration {
        Duration::try_from_secs_f64(duration.as_secs_f64() * self.time_scale)
            .unwrap_or(Duration::MAX)
    }
}

impl Default for SleepTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackTimer for SleepTimer {
    fn wait(&self, duration: Duration) -> WaitOutcome {
        // Drop cancels that arrived while nothing was playing
        while self.cancel_rx.try_recv().is_ok() {}

        let scaled = self.scaled(duration);
        if scaled.is_zero() {
            return WaitOutcome::Completed;
        }

        trace!(?scaled, "Waiting for simulated playback");
        self.waiting.store(true, Ordering::SeqCst);
        let received = self.cancel_rx.recv_timeout(scaled);
        self.waiting.store(false, Ordering::SeqCst);

        match received {
            Ok(()) => WaitOutcome::Cancelled,
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                WaitOutcome::Completed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn instant_timer_completes() {
        assert_eq!(
            InstantTimer.wait(Duration::from_secs(3600)),
            WaitOutcome::Completed
        );
    }

    #[test]
    fn sleep_timer_waits_scaled_duration() {
        let timer = SleepTimer::with_time_scale(0.01);
        let start = Instant::now();
        assert_eq!(timer.wait(Duration::from_secs(2)), WaitOutcome::Completed);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn zero_scale_never_blocks() {
        let timer = SleepTimer::with_time_scale(0.0);
        let start = Instant::now();
        assert_eq!(timer.wait(Duration::from_secs(3600)), WaitOutcome::Completed);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn invalid_scale_falls_back_to_real_time() {
        assert_eq!(SleepTimer::with_time_scale(-2.0).time_scale(), 1.0);
        assert_eq!(SleepTimer::with_time_scale(f64::NAN).time_scale(), 1.0);
    }

    #[test]
    fn cancel_interrupts_wait() {
        let timer = SleepTimer::new();
        let handle = timer.cancel_handle();

        let canceller = thread::spawn(move || {
            while !handle.is_waiting() {
                thread::sleep(Duration::from_millis(5));
            }
            assert!(handle.cancel());
        });

        let start = Instant::now();
        assert_eq!(timer.wait(Duration::from_secs(60)), WaitOutcome::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(30));
        canceller.join().unwrap();
    }

    #[test]
    fn stale_cancel_does_not_skip_next_wait() {
        let timer = SleepTimer::with_time_scale(0.01);
        timer.cancel_handle().tx.send(()).unwrap();
        assert_eq!(timer.wait(Duration::from_secs(1)), WaitOutcome::Completed);
    }

    #[test]
    fn cancel_reports_idle_timer() {
        let timer = SleepTimer::with_time_scale(0.01);
        let handle = timer.cancel_handle();

        assert!(!handle.is_waiting());
        assert!(!handle.cancel());

        assert_eq!(timer.wait(Duration::from_secs(1)), WaitOutcome::Completed);
        assert!(!handle.is_waiting());
    }
}
