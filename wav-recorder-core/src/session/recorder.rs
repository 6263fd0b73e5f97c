use std::sync::Arc;
use std::time::Duration;

use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::models::state::CaptureState;
use crate::processing::capture_buffer::CaptureBuffer;
use crate::processing::pcm;
use crate::processing::wav_format::WavHeader;
use crate::session::controller::{CaptureController, CaptureOutcome};
use crate::storage::{metadata, wav_writer};
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::capture_device::CaptureDevice;
use crate::traits::stop_signal::StopSignal;

/// Records one configured capture to a WAV file.
///
/// Data flow:
/// ```text
/// [CaptureBuffer] → [CaptureController + device] → [WavHeader + data] → file
/// ```
/// The file is only created once capture has fully succeeded, and its header
/// describes exactly the bytes that were captured.
pub struct Recorder<D: CaptureDevice> {
    controller: CaptureController<D>,
    delegate: Option<Arc<dyn CaptureDelegate>>,
    state: CaptureState,
}

impl<D: CaptureDevice> Recorder<D> {
    pub fn new(device: D) -> Self {
        Self {
            controller: CaptureController::new(device),
            delegate: None,
            state: CaptureState::Idle,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.controller.set_delegate(Arc::clone(&delegate));
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn controller(&self) -> &CaptureController<D> {
        &self.controller
    }

    /// Validate, capture, and write the recording described by `config`.
    pub fn record(
        &mut self,
        config: &CaptureConfiguration,
        stop: &dyn StopSignal,
    ) -> Result<RecordingResult, CaptureError> {
        config.validate().map_err(|e| self.fail(e))?;

        let mut buffer =
            CaptureBuffer::allocate(config.format, config.duration_secs).map_err(|e| self.fail(e))?;

        let duration = Duration::from_secs(config.duration_secs as u64);
        let outcome = match self.controller.capture(&mut buffer, duration, stop) {
            Ok(outcome) => outcome,
            Err(e) => {
                // Already reported to the delegate by the controller.
                self.state = CaptureState::Failed(e.clone());
                return Err(e);
            }
        };

        let result = self.write(config, &buffer, outcome).map_err(|e| self.fail(e))?;

        self.set_state(CaptureState::Completed(Box::new(result.clone())));
        if let Some(ref delegate) = self.delegate {
            delegate.on_capture_finished(&result);
        }
        Ok(result)
    }

    fn write(
        &mut self,
        config: &CaptureConfiguration,
        buffer: &CaptureBuffer,
        outcome: CaptureOutcome,
    ) -> Result<RecordingResult, CaptureError> {
        self.set_state(CaptureState::Writing);

        let data = buffer.recorded();
        let data_size = u32::try_from(data.len())
            .map_err(|_| CaptureError::StorageError(format!("{} bytes do not fit a WAV file", data.len())))?;
        if outcome.interrupted {
            log::info!(
                "stopped early: {} of {} bytes captured",
                data_size,
                buffer.len()
            );
        }

        let header = WavHeader::new(config.format, data_size)?;
        let checksum = wav_writer::write_wav_file(&config.output_path, &header, data)?;

        let levels = if config.format.bits_per_sample == 16 {
            pcm::levels(data)
        } else {
            Default::default()
        };
        let recording_metadata = RecordingMetadata::new(
            &config.output_path.to_string_lossy(),
            config.format,
            data_size,
            outcome.interrupted,
            levels,
            &checksum,
        );
        if config.write_metadata {
            // The WAV is complete and synced at this point; a missing sidecar
            // does not fail the recording.
            match metadata::write_metadata(&recording_metadata, &config.output_path) {
                Ok(path) => log::info!("metadata written to {}", path.display()),
                Err(e) => log::warn!("recording kept without metadata sidecar: {}", e),
            }
        }

        log::info!(
            "wrote {} ({} data bytes, sha256 {})",
            config.output_path.display(),
            data_size,
            checksum
        );

        Ok(RecordingResult {
            file_path: config.output_path.clone(),
            duration_secs: recording_metadata.duration_secs,
            requested_duration_secs: config.duration_secs,
            data_size,
            interrupted: outcome.interrupted,
            levels,
            checksum,
            metadata: recording_metadata,
        })
    }

    fn set_state(&mut self, new_state: CaptureState) {
        log::debug!("recorder state: {}", new_state.label());
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&new_state);
        }
        self.state = new_state;
    }

    fn fail(&mut self, error: CaptureError) -> CaptureError {
        log::error!("recording failed: {}", error);
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(&error);
        }
        self.set_state(CaptureState::Failed(error.clone()));
        error
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use parking_lot::Mutex;

    use super::*;
    use crate::backend::simulated::{SimulatedDevice, SimulatedSignal};
    use crate::models::audio_models::AudioFormat;
    use crate::models::error::DeviceStep;
    use crate::processing::wav_format::parse_header;
    use crate::storage::metadata::read_metadata;
    use crate::storage::wav_writer::sha256_file;
    use crate::traits::stop_signal::WaitOutcome;

    /// Returns at once, as if the whole duration had passed.
    struct Elapsed;

    impl StopSignal for Elapsed {
        fn wait(&self, _duration: Duration) -> WaitOutcome {
            WaitOutcome::Elapsed
        }
    }

    /// Returns at once, as if the user pressed Enter.
    struct Interrupt;

    impl StopSignal for Interrupt {
        fn wait(&self, _duration: Duration) -> WaitOutcome {
            WaitOutcome::Interrupted
        }
    }

    #[derive(Default)]
    struct StateLog {
        states: Mutex<Vec<&'static str>>,
        finished: Mutex<Option<RecordingResult>>,
    }

    impl CaptureDelegate for StateLog {
        fn on_state_changed(&self, state: &CaptureState) {
            self.states.lock().push(state.label());
        }

        fn on_error(&self, _error: &CaptureError) {}

        fn on_capture_finished(&self, result: &RecordingResult) {
            *self.finished.lock() = Some(result.clone());
        }
    }

    fn temp_file_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("wav_recorder_rec_{}_{}", std::process::id(), name))
    }

    fn config_for(name: &str, duration_secs: u32) -> CaptureConfiguration {
        CaptureConfiguration {
            duration_secs,
            output_path: temp_file_path(name),
            ..Default::default()
        }
    }

    fn read_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
    }

    #[test]
    fn one_second_recording_is_byte_exact() {
        let config = config_for("one_second.wav", 1);
        let device = SimulatedDevice::new().with_signal(SimulatedSignal::Tone {
            frequency_hz: 440.0,
            amplitude: 0.5,
        });
        let log = device.call_log();
        let mut recorder = Recorder::new(device);

        let result = recorder.record(&config, &Elapsed).unwrap();

        let bytes = fs::read(&config.output_path).unwrap();
        assert_eq!(bytes.len(), 176_444);
        assert_eq!(read_u32(&bytes, 4), 176_436);
        assert_eq!(read_u32(&bytes, 40), 176_400);
        assert_eq!(result.data_size, 176_400);
        assert!(!result.interrupted);
        assert!((result.duration_secs - 1.0).abs() < 1e-9);
        assert!(result.levels.peak > 0.4);
        assert_eq!(result.checksum, sha256_file(&config.output_path).unwrap());
        assert!(recorder.state().is_terminal());
        assert_eq!(log.live_handles(), 0);

        let header = parse_header(&bytes).unwrap();
        assert_eq!(header.format(), AudioFormat::CD_STEREO);
        assert_eq!(header.data_size(), 176_400);

        let reader = hound::WavReader::open(&config.output_path).unwrap();
        assert_eq!(reader.spec().sample_rate, 44100);
        assert_eq!(reader.duration(), 44100);

        fs::remove_file(&config.output_path).ok();
    }

    #[test]
    fn open_failure_writes_no_file() {
        let config = config_for("open_failure.wav", 1);
        fs::remove_file(&config.output_path).ok();
        let device = SimulatedDevice::new().busy();
        let log = device.call_log();
        let mut recorder = Recorder::new(device);

        let err = recorder.record(&config, &Elapsed).unwrap_err();

        assert!(matches!(err, CaptureError::DeviceNotAvailable(_)));
        assert!(!config.output_path.exists());
        assert_eq!(log.calls(), vec![DeviceStep::Open]);
        assert_eq!(log.live_handles(), 0);
        assert!(matches!(recorder.state(), CaptureState::Failed(_)));
    }

    #[test]
    fn mid_capture_failure_writes_no_file_and_releases() {
        let config = config_for("start_failure.wav", 1);
        fs::remove_file(&config.output_path).ok();
        let device = SimulatedDevice::new().failing_at(DeviceStep::Start);
        let log = device.call_log();
        let mut recorder = Recorder::new(device);

        assert!(matches!(
            recorder.record(&config, &Elapsed),
            Err(CaptureError::StartFailed(_))
        ));
        assert!(!config.output_path.exists());
        assert_eq!(log.count(DeviceStep::Release), 1);
        assert_eq!(log.live_handles(), 0);
    }

    #[test]
    fn invalid_duration_never_opens_device() {
        let config = config_for("zero.wav", 0);
        let device = SimulatedDevice::new();
        let log = device.call_log();
        let mut recorder = Recorder::new(device);

        assert!(matches!(
            recorder.record(&config, &Elapsed),
            Err(CaptureError::InvalidArgument(_))
        ));
        assert!(log.calls().is_empty());
        assert!(!config.output_path.exists());
    }

    #[test]
    fn early_stop_truncates_data_size() {
        let config = config_for("early_stop.wav", 2);
        let device = SimulatedDevice::new().with_captured_limit(10_002);
        let mut recorder = Recorder::new(device);

        let result = recorder.record(&config, &Interrupt).unwrap();

        assert!(result.interrupted);
        assert_eq!(result.data_size, 10_000);
        let bytes = fs::read(&config.output_path).unwrap();
        assert_eq!(bytes.len(), 44 + 10_000);
        assert_eq!(read_u32(&bytes, 40), 10_000);
        assert_eq!(read_u32(&bytes, 4), 36 + 10_000);

        fs::remove_file(&config.output_path).ok();
    }

    #[test]
    fn unwritable_output_releases_device_first() {
        let blocker = temp_file_path("blocker");
        fs::write(&blocker, b"not a directory").unwrap();
        let config = CaptureConfiguration {
            output_path: blocker.join("take.wav"),
            ..Default::default()
        };
        let device = SimulatedDevice::new();
        let log = device.call_log();
        let mut recorder = Recorder::new(device);

        let err = recorder.record(&config, &Elapsed).unwrap_err();

        assert!(matches!(err, CaptureError::StorageError(_)));
        assert_eq!(log.calls().last(), Some(&DeviceStep::Release));
        assert_eq!(log.live_handles(), 0);
        fs::remove_file(&blocker).ok();
    }

    #[test]
    fn writes_metadata_sidecar() {
        let config = CaptureConfiguration {
            write_metadata: true,
            ..config_for("with_meta.wav", 1)
        };
        let mut recorder = Recorder::new(SimulatedDevice::new());

        let result = recorder.record(&config, &Elapsed).unwrap();

        let sidecar = read_metadata(&config.output_path).unwrap();
        assert_eq!(sidecar, result.metadata);
        assert_eq!(sidecar.data_size, 176_400);
        assert_eq!(sidecar.checksum, result.checksum);

        fs::remove_file(metadata::metadata_path(&config.output_path)).ok();
        fs::remove_file(&config.output_path).ok();
    }

    #[test]
    fn sidecar_failure_keeps_recording() {
        let config = CaptureConfiguration {
            write_metadata: true,
            ..config_for("meta_blocked.wav", 1)
        };
        let sidecar = metadata::metadata_path(&config.output_path);
        fs::create_dir_all(&sidecar).unwrap();
        let mut recorder = Recorder::new(SimulatedDevice::new());

        let result = recorder.record(&config, &Elapsed).unwrap();

        assert_eq!(result.data_size, 176_400);
        assert_eq!(fs::metadata(&config.output_path).unwrap().len(), 176_444);
        assert!(sidecar.is_dir());
        assert!(matches!(recorder.state(), CaptureState::Completed(_)));

        fs::remove_dir_all(&sidecar).ok();
        fs::remove_file(&config.output_path).ok();
    }

    #[test]
    fn delegate_follows_full_lifecycle() {
        let config = config_for("delegate.wav", 1);
        let delegate = Arc::new(StateLog::default());
        let mut recorder = Recorder::new(SimulatedDevice::new());
        recorder.set_delegate(delegate.clone());

        let result = recorder.record(&config, &Elapsed).unwrap();

        assert_eq!(
            *delegate.states.lock(),
            vec!["opening", "capturing", "stopping", "writing", "completed"]
        );
        assert_eq!(delegate.finished.lock().as_ref(), Some(&result));

        fs::remove_file(&config.output_path).ok();
    }
}
