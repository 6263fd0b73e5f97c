use crate::models::audio_models::{AudioFormat, AudioSource};
use crate::models::error::CaptureError;

/// Capability interface of a buffer-based audio input device.
///
/// Implemented by:
/// - `WaveInDevice` (Windows waveIn API)
/// - `SimulatedDevice` (tests and `--simulate`)
///
/// The caller drives the handle strictly in order
/// `open → prepare_buffer → submit → start → stop → release`, passing the
/// same buffer to every call. Backends may retain the buffer's address from
/// `prepare_buffer` until `release` returns; callers must keep the buffer
/// alive and unmoved for that span. `CaptureController` upholds this.
pub trait CaptureDevice {
    /// Opened input channel.
    type Handle;

    /// Acquire exclusive access to the default input configured for `format`.
    ///
    /// Fails with `DeviceNotAvailable` when no compatible device exists or
    /// it is already in use.
    fn open(&mut self, format: &AudioFormat) -> Result<Self::Handle, CaptureError>;

    /// Associate the destination buffer with the device.
    fn prepare_buffer(&mut self, handle: &mut Self::Handle, buffer: &mut [u8]) -> Result<(), CaptureError>;

    /// Queue the prepared buffer to receive incoming samples.
    fn submit(&mut self, handle: &mut Self::Handle, buffer: &mut [u8]) -> Result<(), CaptureError>;

    /// Begin streaming into the submitted buffer.
    fn start(&mut self, handle: &mut Self::Handle) -> Result<(), CaptureError>;

    /// Halt streaming and return how many bytes of `buffer` were filled.
    ///
    /// Buffer contents are stable once this returns.
    fn stop(&mut self, handle: &mut Self::Handle, buffer: &mut [u8]) -> Result<usize, CaptureError>;

    /// Unassociate the buffer and close the handle.
    ///
    /// Runs exactly once per successful `open`, on success and error paths
    /// alike. The handle is closed even when unassociating fails.
    fn release(&mut self, handle: Self::Handle, buffer: &mut [u8]) -> Result<(), CaptureError>;

    /// Information about the device backing this backend.
    fn device_info(&self) -> AudioSource;
}
