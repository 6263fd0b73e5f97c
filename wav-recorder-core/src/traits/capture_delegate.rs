use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;

/// Event delegate for recording notifications.
///
/// All methods are called synchronously on the recording thread.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the recording state changes.
    fn on_state_changed(&self, state: &CaptureState);

    /// Called when a step fails, before cleanup runs.
    fn on_error(&self, error: &CaptureError);

    /// Called once the file is written and closed.
    fn on_capture_finished(&self, result: &RecordingResult);
}
