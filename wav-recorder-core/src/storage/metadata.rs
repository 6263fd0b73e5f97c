use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingMetadata;

/// Path of the JSON sidecar for a recording: `take.wav` → `take.metadata.json`.
pub fn metadata_path(recording_path: &Path) -> PathBuf {
    recording_path.with_extension("metadata.json")
}

/// Write recording metadata as a JSON sidecar file.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<PathBuf, CaptureError> {
    let path = metadata_path(recording_path);
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| CaptureError::StorageError(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&path, json).map_err(|e| CaptureError::StorageError(format!("failed to write metadata: {}", e)))?;
    Ok(path)
}

/// Read recording metadata from a JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, CaptureError> {
    let json = fs::read_to_string(metadata_path(recording_path))
        .map_err(|e| CaptureError::StorageError(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json).map_err(|e| CaptureError::StorageError(format!("failed to parse metadata: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audio_models::{AudioFormat, AudioLevels};

    #[test]
    fn sidecar_round_trip() {
        let recording = std::env::temp_dir().join(format!("wav_recorder_meta_{}.wav", std::process::id()));
        let metadata = RecordingMetadata::new(
            &recording.to_string_lossy(),
            AudioFormat::CD_STEREO,
            176_400,
            false,
            AudioLevels { rms: 0.25, peak: 0.5 },
            "deadbeef",
        );

        let sidecar = write_metadata(&metadata, &recording).unwrap();
        assert!(sidecar.to_string_lossy().ends_with(".metadata.json"));
        assert_eq!(read_metadata(&recording).unwrap(), metadata);

        fs::remove_file(&sidecar).ok();
    }

    #[test]
    fn missing_sidecar_is_storage_error() {
        let recording = std::env::temp_dir().join("wav_recorder_meta_missing_9f3a.wav");
        assert!(matches!(read_metadata(&recording), Err(CaptureError::StorageError(_))));
    }
}
