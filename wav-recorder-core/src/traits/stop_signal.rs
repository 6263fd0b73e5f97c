use std::time::Duration;

/// How a capture wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full duration elapsed.
    Elapsed,
    /// A manual stop arrived first.
    Interrupted,
}

/// Blocks the recording thread while the device fills the buffer.
///
/// Stopping is cooperative: the wait returns and the caller then stops the
/// device. Nothing is preempted.
pub trait StopSignal {
    fn wait(&self, duration: Duration) -> WaitOutcome;
}
