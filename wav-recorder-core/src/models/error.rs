use std::fmt;

use thiserror::Error;

/// Step of the device lifecycle an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceStep {
    Open,
    Prepare,
    Submit,
    Start,
    Stop,
    Release,
}

impl fmt::Display for DeviceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Prepare => "prepare",
            Self::Submit => "submit",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Release => "release",
        };
        f.write_str(name)
    }
}

/// Coarse error category, one per failure class the recorder reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Argument,
    Allocation,
    Device,
    File,
}

/// Errors that can occur while recording.
///
/// Every variant is fatal to the run; callers release whatever was acquired
/// and exit non-zero.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to allocate a {bytes}-byte capture buffer")]
    AllocationFailed { bytes: usize },

    #[error("audio input device not available: {0}")]
    DeviceNotAvailable(String),

    #[error("failed to prepare audio buffer: {0}")]
    PrepareFailed(String),

    #[error("failed to submit audio buffer: {0}")]
    SubmitFailed(String),

    #[error("failed to start audio recording: {0}")]
    StartFailed(String),

    #[error("failed to stop audio recording: {0}")]
    StopFailed(String),

    #[error("failed to release audio device: {0}")]
    ReleaseFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("invalid WAV data: {0}")]
    InvalidWav(String),
}

impl CaptureError {
    /// Build the error a failed device step maps to.
    pub fn device(step: DeviceStep, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        match step {
            DeviceStep::Open => Self::DeviceNotAvailable(reason),
            DeviceStep::Prepare => Self::PrepareFailed(reason),
            DeviceStep::Submit => Self::SubmitFailed(reason),
            DeviceStep::Start => Self::StartFailed(reason),
            DeviceStep::Stop => Self::StopFailed(reason),
            DeviceStep::Release => Self::ReleaseFailed(reason),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::Argument,
            Self::AllocationFailed { .. } => ErrorKind::Allocation,
            Self::DeviceNotAvailable(_)
            | Self::PrepareFailed(_)
            | Self::SubmitFailed(_)
            | Self::StartFailed(_)
            | Self::StopFailed(_)
            | Self::ReleaseFailed(_) => ErrorKind::Device,
            Self::StorageError(_) | Self::InvalidWav(_) => ErrorKind::File,
        }
    }

    /// The device step this error came from, if it is a device error.
    pub fn device_step(&self) -> Option<DeviceStep> {
        match self {
            Self::DeviceNotAvailable(_) => Some(DeviceStep::Open),
            Self::PrepareFailed(_) => Some(DeviceStep::Prepare),
            Self::SubmitFailed(_) => Some(DeviceStep::Submit),
            Self::StartFailed(_) => Some(DeviceStep::Start),
            Self::StopFailed(_) => Some(DeviceStep::Stop),
            Self::ReleaseFailed(_) => Some(DeviceStep::Release),
            _ => None,
        }
    }
}
