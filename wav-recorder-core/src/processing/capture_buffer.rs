use crate::models::audio_models::AudioFormat;
use crate::models::error::CaptureError;

/// Fixed-size destination buffer for one whole capture.
///
/// Allocated once before the device is opened and never resized afterwards:
/// the device writes into it by address, so the storage is a boxed slice
/// whose heap location is stable for the buffer's lifetime.
#[derive(Debug)]
pub struct CaptureBuffer {
    data: Box<[u8]>,
    format: AudioFormat,
    recorded: usize,
}

impl CaptureBuffer {
    /// Allocate a zeroed buffer holding `duration_secs` of `format` audio.
    pub fn allocate(format: AudioFormat, duration_secs: u32) -> Result<Self, CaptureError> {
        let size = format.bytes_for_duration(duration_secs);
        let bytes = usize::try_from(size).map_err(|_| CaptureError::AllocationFailed { bytes: usize::MAX })?;
        Self::with_len(format, bytes)
    }

    /// Allocate a zeroed buffer of exactly `bytes` bytes.
    pub fn with_len(format: AudioFormat, bytes: usize) -> Result<Self, CaptureError> {
        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|_| CaptureError::AllocationFailed { bytes })?;
        data.resize(bytes, 0);
        log::debug!("allocated {} byte capture buffer", bytes);
        Ok(Self {
            data: data.into_boxed_slice(),
            format,
            recorded: 0,
        })
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Total capacity in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whole buffer, for the device to fill.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Record how many bytes the device filled.
    ///
    /// Clamped to the capacity and rounded down to whole sample frames so a
    /// partial frame is never exposed.
    pub fn set_recorded(&mut self, bytes: usize) {
        let block = self.format.block_align().max(1) as usize;
        let clamped = bytes.min(self.data.len());
        self.recorded = clamped - clamped % block;
    }

    /// Number of valid bytes.
    pub fn recorded_len(&self) -> usize {
        self.recorded
    }

    /// The captured prefix of the buffer.
    pub fn recorded(&self) -> &[u8] {
        &self.data[..self.recorded]
    }
}
