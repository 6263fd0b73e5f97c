use super::error::CaptureError;
use super::recording_result::RecordingResult;

/// Recording state machine.
///
/// State transitions:
/// ```text
/// idle → opening → capturing → stopping → writing → completed
///           ↓          ↓          ↓          ↓
///         failed     failed     failed     failed
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    Opening,
    Capturing { duration_secs: u32 },
    Stopping,
    Writing,
    Completed(Box<RecordingResult>),
    Failed(CaptureError),
}

impl CaptureState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }

    /// Short label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Opening => "opening",
            Self::Capturing { .. } => "capturing",
            Self::Stopping => "stopping",
            Self::Writing => "writing",
            Self::Completed(_) => "completed",
            Self::Failed(_) => "failed",
        }
    }
}
