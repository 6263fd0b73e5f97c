//! # wav-recorder-windows
//!
//! Windows backend for wav-recorder.
//!
//! Provides:
//! - `WaveInDevice`: default input capture via the waveIn API
//!
//! ## Usage
//! ```ignore
//! use wav_recorder_core::{CaptureConfiguration, Recorder, TimerStop};
//! use wav_recorder_windows::WaveInDevice;
//!
//! let config = CaptureConfiguration::from_args("take.wav", Some("5"))?;
//! let mut recorder = Recorder::new(WaveInDevice::default_device());
//! let result = recorder.record(&config, &TimerStop)?;
//! ```

#[cfg(target_os = "windows")]
pub mod wave_in;

#[cfg(target_os = "windows")]
pub use wave_in::WaveInDevice;
