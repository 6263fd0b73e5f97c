use std::io::{self, BufRead};
use std::thread;

use wav_recorder_core::{CaptureDelegate, CaptureError, CaptureState, RecordingResult, StopHandle};

/// Prints recording progress to the terminal.
pub struct ConsoleDelegate {
    interactive: bool,
}

impl ConsoleDelegate {
    pub fn new(interactive: bool) -> Self {
        Self { interactive }
    }
}

impl CaptureDelegate for ConsoleDelegate {
    fn on_state_changed(&self, state: &CaptureState) {
        if let CaptureState::Capturing { duration_secs } = state {
            if self.interactive {
                println!("Recording for up to {} s... Press Enter to stop.", duration_secs);
            } else {
                println!("Recording for {} s...", duration_secs);
            }
        }
    }

    fn on_error(&self, error: &CaptureError) {
        log::debug!("delegate saw error: {}", error);
    }

    fn on_capture_finished(&self, result: &RecordingResult) {
        if result.interrupted {
            println!(
                "Stopped early after {:.2} s of {} s",
                result.duration_secs, result.requested_duration_secs
            );
        }
    }
}

/// Stop the capture when a line arrives on stdin.
///
/// On EOF the handle is dropped and the capture runs its full length.
pub fn spawn_enter_listener(handle: StopHandle) {
    let spawned = thread::Builder::new()
        .name("enter-listener".into())
        .spawn(move || {
            let mut line = String::new();
            match io::stdin().lock().read_line(&mut line) {
                Ok(0) => log::debug!("stdin closed; recording full duration"),
                Ok(_) => handle.stop(),
                Err(e) => log::warn!("failed to read stdin: {}", e),
            }
        });
    if let Err(e) = spawned {
        log::warn!("failed to spawn enter listener: {}", e);
    }
}
