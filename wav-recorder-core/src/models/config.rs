use std::path::{Path, PathBuf};

use super::audio_models::AudioFormat;
use super::error::CaptureError;

/// Capture length used when no duration is given on the command line.
pub const DEFAULT_DURATION_SECS: u32 = 1;

/// Longest capture accepted, in seconds.
///
/// The whole capture lives in one contiguous buffer; at CD stereo one hour
/// is about 635 MB.
pub const MAX_DURATION_SECS: u32 = 3600;

/// Largest data chunk a RIFF header can describe.
const MAX_DATA_SIZE: u64 = u32::MAX as u64 - 36;

/// Configuration for one recording run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfiguration {
    /// Sample layout requested from the device and written to the header.
    pub format: AudioFormat,

    /// Requested capture length in seconds.
    pub duration_secs: u32,

    /// Destination WAV file.
    pub output_path: PathBuf,

    /// Allow a manual stop signal to end the capture early.
    pub stop_on_enter: bool,

    /// Write a `.metadata.json` sidecar next to the recording.
    pub write_metadata: bool,
}

impl CaptureConfiguration {
    /// Build a configuration from the raw command-line arguments.
    ///
    /// Fails before anything is allocated or opened.
    pub fn from_args(output_path: &str, duration: Option<&str>) -> Result<Self, CaptureError> {
        if output_path.trim().is_empty() {
            return Err(CaptureError::InvalidArgument("output path is empty".into()));
        }
        let duration_secs = match duration {
            Some(raw) => parse_duration_secs(raw)?,
            None => DEFAULT_DURATION_SECS,
        };
        let config = Self {
            duration_secs,
            output_path: ensure_wav_extension(Path::new(output_path)),
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.format.sample_rate == 0 {
            return Err(CaptureError::InvalidArgument("sample rate must be positive".into()));
        }
        if ![8, 16, 24, 32].contains(&self.format.bits_per_sample) {
            return Err(CaptureError::InvalidArgument(format!(
                "unsupported bits per sample: {}",
                self.format.bits_per_sample
            )));
        }
        if self.format.channels == 0 {
            return Err(CaptureError::InvalidArgument("channel count must be positive".into()));
        }
        if self.duration_secs == 0 || self.duration_secs > MAX_DURATION_SECS {
            return Err(CaptureError::InvalidArgument(format!(
                "duration must be between 1 and {} seconds, got {}",
                MAX_DURATION_SECS, self.duration_secs
            )));
        }
        if self.format.checked_byte_rate().is_none() || self.format.checked_block_align().is_none() {
            return Err(CaptureError::InvalidArgument(format!(
                "{} channels at {} Hz do not fit a WAV header",
                self.format.channels, self.format.sample_rate
            )));
        }
        let data_size = self.format.bytes_for_duration(self.duration_secs);
        if data_size > MAX_DATA_SIZE {
            return Err(CaptureError::InvalidArgument(format!(
                "{} seconds at {} bytes/s exceeds the WAV size limit",
                self.duration_secs,
                self.format.byte_rate()
            )));
        }
        Ok(())
    }

    /// Size of the capture buffer this configuration needs.
    pub fn buffer_size(&self) -> u64 {
        self.format.bytes_for_duration(self.duration_secs)
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            format: AudioFormat::CD_STEREO,
            duration_secs: DEFAULT_DURATION_SECS,
            output_path: PathBuf::from("recording.wav"),
            stop_on_enter: false,
            write_metadata: false,
        }
    }
}

/// Parse a duration argument as a positive whole number of seconds.
pub fn parse_duration_secs(raw: &str) -> Result<u32, CaptureError> {
    let raw = raw.trim();
    let secs: i64 = raw
        .parse()
        .map_err(|_| CaptureError::InvalidArgument(format!("duration must be a whole number of seconds, got {:?}", raw)))?;
    if secs <= 0 {
        return Err(CaptureError::InvalidArgument(format!("duration must be positive, got {}", secs)));
    }
    if secs > MAX_DURATION_SECS as i64 {
        return Err(CaptureError::InvalidArgument(format!(
            "duration must be at most {} seconds, got {}",
            MAX_DURATION_SECS, secs
        )));
    }
    Ok(secs as u32)
}

/// Append `.wav` to `path` unless it already ends in it (any case).
pub fn ensure_wav_extension(path: &Path) -> PathBuf {
    let has_wav = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
    if has_wav {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(".wav");
    PathBuf::from(name)
}
