//! 16-bit PCM helpers: level metering, float conversion, tone synthesis.

use std::f32::consts::TAU;

use crate::models::audio_models::AudioLevels;

/// Convert float samples (-1.0..1.0) to 16-bit little-endian PCM bytes.
///
/// Out-of-range input is clamped.
pub fn f32_to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        let value = (clamped * i16::MAX as f32) as i16;
        pcm.extend_from_slice(&value.to_le_bytes());
    }
    pcm
}

fn pcm16_samples(pcm: &[u8]) -> impl Iterator<Item = f32> + '_ {
    pcm.chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / -(i16::MIN as f32))
}

/// Root-mean-square level of 16-bit PCM (0.0 to 1.0).
pub fn rms_level(pcm: &[u8]) -> f32 {
    let count = pcm.len() / 2;
    if count == 0 {
        return 0.0;
    }
    let sum_squares: f32 = pcm16_samples(pcm).map(|s| s * s).sum();
    (sum_squares / count as f32).sqrt()
}

/// Peak absolute level of 16-bit PCM (0.0 to 1.0).
pub fn peak_level(pcm: &[u8]) -> f32 {
    pcm16_samples(pcm).map(f32::abs).fold(0.0f32, f32::max)
}

pub fn levels(pcm: &[u8]) -> AudioLevels {
    AudioLevels {
        rms: rms_level(pcm),
        peak: peak_level(pcm),
    }
}

/// Fill `out` with an interleaved 16-bit sine tone, the same signal on
/// every channel. Trailing bytes that do not make up a whole frame are left
/// untouched.
pub fn tone_pcm16(out: &mut [u8], sample_rate: u32, channels: u16, frequency_hz: f32, amplitude: f32) {
    let channels = channels.max(1) as usize;
    let frame_bytes = channels * 2;
    let step = TAU * frequency_hz / sample_rate.max(1) as f32;
    for (index, frame) in out.chunks_exact_mut(frame_bytes).enumerate() {
        let phase = (index as f32 * step) % TAU;
        let value = (phase.sin() * amplitude.clamp(0.0, 1.0) * i16::MAX as f32) as i16;
        for sample in frame.chunks_exact_mut(2) {
            sample.copy_from_slice(&value.to_le_bytes());
        }
    }
}
