use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::audio_models::{AudioFormat, AudioLevels};

/// Result returned when a recording completes successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    /// Length of the audio actually written.
    pub duration_secs: f64,
    pub requested_duration_secs: u32,
    /// Bytes of PCM data following the 44-byte header.
    pub data_size: u32,
    /// Capture ended on a manual stop before the requested duration.
    pub interrupted: bool,
    pub levels: AudioLevels,
    /// SHA-256 hex digest of the complete file.
    pub checksum: String,
    pub metadata: RecordingMetadata,
}

/// Metadata stored alongside a recording.
///
/// Serializable for the JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub file_path: String,
    pub format: AudioFormat,
    pub duration_secs: f64,
    pub data_size: u32,
    pub interrupted: bool,
    pub levels: AudioLevels,
    pub checksum: String,
}

impl RecordingMetadata {
    pub fn new(
        file_path: &str,
        format: AudioFormat,
        data_size: u32,
        interrupted: bool,
        levels: AudioLevels,
        checksum: &str,
    ) -> Self {
        let byte_rate = format.byte_rate().max(1);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            file_path: file_path.to_string(),
            format,
            duration_secs: data_size as f64 / byte_rate as f64,
            data_size,
            interrupted,
            levels,
            checksum: checksum.to_string(),
        }
    }
}
