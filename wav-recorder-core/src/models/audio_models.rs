use serde::{Deserialize, Serialize};

/// PCM sample layout of a capture.
///
/// `byte_rate` and `block_align` are always derived from the three stored
/// fields and never stored on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: u16,
}

impl AudioFormat {
    /// 44.1 kHz, 16-bit, stereo. The format every capture in this crate uses.
    pub const CD_STEREO: AudioFormat = AudioFormat {
        sample_rate: 44100,
        bits_per_sample: 16,
        channels: 2,
    };

    /// Bytes per sample frame across all channels, or `None` if that does
    /// not fit the 16-bit header field.
    pub fn checked_block_align(&self) -> Option<u16> {
        u16::try_from(self.channels as u32 * self.bits_per_sample as u32 / 8).ok()
    }

    /// Bytes of audio produced per second, or `None` if that does not fit
    /// the 32-bit header field.
    pub fn checked_byte_rate(&self) -> Option<u32> {
        u32::try_from(self.wide_byte_rate()).ok()
    }

    /// Bytes per sample frame across all channels. Saturates at `u16::MAX`.
    pub fn block_align(&self) -> u16 {
        self.checked_block_align().unwrap_or(u16::MAX)
    }

    /// Bytes of audio produced per second. Saturates at `u32::MAX`.
    pub fn byte_rate(&self) -> u32 {
        self.checked_byte_rate().unwrap_or(u32::MAX)
    }

    /// Buffer size needed to hold `duration_secs` of audio, in bytes.
    ///
    /// Computed in 64-bit so oversized requests are detectable by the caller.
    pub fn bytes_for_duration(&self, duration_secs: u32) -> u64 {
        self.wide_byte_rate().saturating_mul(duration_secs as u64)
    }

    fn wide_byte_rate(&self) -> u64 {
        self.sample_rate as u64 * self.channels as u64 * self.bits_per_sample as u64 / 8
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::CD_STEREO
    }
}

/// An audio device available for capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSource {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

/// Signal level of a recording (RMS and peak, 0.0 to 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioLevels {
    pub rms: f32,
    pub peak: f32,
}
