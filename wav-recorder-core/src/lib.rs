//! # wav-recorder-core
//!
//! Platform-agnostic core of the fixed-duration WAV recorder.
//!
//! Provides the capture lifecycle, the single capture buffer, WAV encoding
//! and parsing, and the recording pipeline. Platform backends (Windows
//! waveIn) implement the `CaptureDevice` trait and plug into the generic
//! `CaptureController`.
//!
//! ## Architecture
//!
//! ```text
//! wav-recorder-core (this crate)
//! ├── traits/       ← CaptureDevice, CaptureDelegate, StopSignal
//! ├── models/       ← CaptureError, CaptureState, CaptureConfiguration, AudioFormat, etc.
//! ├── processing/   ← CaptureBuffer, WAV header encode/parse, PCM levels
//! ├── session/      ← CaptureController, Recorder, stop signals
//! ├── storage/      ← WavFileWriter, metadata sidecar
//! └── backend/      ← SimulatedDevice
//! ```

pub mod backend;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use backend::simulated::{CallLog, Pacing, SimulatedDevice, SimulatedSignal};
pub use models::audio_models::{AudioFormat, AudioLevels, AudioSource};
pub use models::config::{CaptureConfiguration, DEFAULT_DURATION_SECS, MAX_DURATION_SECS};
pub use models::error::{CaptureError, DeviceStep, ErrorKind};
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::CaptureState;
pub use processing::capture_buffer::CaptureBuffer;
pub use processing::wav_format::{WavHeader, WAV_HEADER_SIZE};
pub use session::controller::{CaptureController, CaptureOutcome};
pub use session::recorder::Recorder;
pub use session::wait::{ChannelStop, StopHandle, TimerStop};
pub use storage::wav_writer::WavFileWriter;
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::capture_device::CaptureDevice;
pub use traits::stop_signal::{StopSignal, WaitOutcome};
