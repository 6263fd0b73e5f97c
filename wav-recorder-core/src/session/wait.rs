use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::traits::stop_signal::{StopSignal, WaitOutcome};

/// Waits out the full duration. No early stop.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerStop;

impl StopSignal for TimerStop {
    fn wait(&self, duration: Duration) -> WaitOutcome {
        thread::sleep(duration);
        WaitOutcome::Elapsed
    }
}

/// Sending half of a [`ChannelStop`].
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Sender<()>,
}

impl StopHandle {
    /// Request an early stop. A no-op once the wait has finished.
    pub fn stop(&self) {
        let _ = self.tx.send(());
    }
}

/// Wait that a [`StopHandle`] can cut short.
///
/// If every handle is dropped without stopping, the remainder of the
/// duration is slept out.
#[derive(Debug)]
pub struct ChannelStop {
    rx: Receiver<()>,
}

impl ChannelStop {
    pub fn new() -> (StopHandle, ChannelStop) {
        let (tx, rx) = mpsc::channel();
        (StopHandle { tx }, ChannelStop { rx })
    }
}

impl StopSignal for ChannelStop {
    fn wait(&self, duration: Duration) -> WaitOutcome {
        let started = Instant::now();
        match self.rx.recv_timeout(duration) {
            Ok(()) => WaitOutcome::Interrupted,
            Err(RecvTimeoutError::Timeout) => WaitOutcome::Elapsed,
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(duration.saturating_sub(started.elapsed()));
                WaitOutcome::Elapsed
            }
        }
    }
}
