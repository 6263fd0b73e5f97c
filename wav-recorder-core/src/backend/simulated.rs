//! In-process capture device that synthesizes audio instead of reading
//! hardware.
//!
//! Drives the full open → release lifecycle with the same ordering rules a
//! real backend enforces, records every call, and can be told to fail at
//! any step.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::models::audio_models::{AudioFormat, AudioSource};
use crate::models::error::{CaptureError, DeviceStep};
use crate::processing::pcm;
use crate::traits::capture_device::CaptureDevice;

/// What the simulated microphone "hears".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimulatedSignal {
    Silence,
    Tone { frequency_hz: f32, amplitude: f32 },
}

/// How much audio is available when the device is stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// The buffer is full as soon as capture starts.
    Instant,
    /// Audio accrues at the format's byte rate from `start`.
    RealTime,
}

#[derive(Debug, Default)]
struct CallLogInner {
    calls: Vec<DeviceStep>,
    live_handles: usize,
}

/// Shared record of the calls made on a [`SimulatedDevice`].
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    inner: Arc<Mutex<CallLogInner>>,
}

impl CallLog {
    /// Every step attempted, in order, including ones that failed.
    pub fn calls(&self) -> Vec<DeviceStep> {
        self.inner.lock().calls.clone()
    }

    pub fn count(&self, step: DeviceStep) -> usize {
        self.inner.lock().calls.iter().filter(|&&c| c == step).count()
    }

    /// Handles opened and not yet released.
    pub fn live_handles(&self) -> usize {
        self.inner.lock().live_handles
    }

    fn record(&self, step: DeviceStep) {
        self.inner.lock().calls.push(step);
    }
}

/// Handle of an opened [`SimulatedDevice`].
#[derive(Debug)]
pub struct SimulatedHandle {
    format: AudioFormat,
    buffer_addr: Option<usize>,
    queued: bool,
    started_at: Option<Instant>,
}

impl SimulatedHandle {
    fn check_buffer(&self, step: DeviceStep, buffer: &[u8]) -> Result<(), CaptureError> {
        match self.buffer_addr {
            Some(addr) if addr == buffer.as_ptr() as usize => Ok(()),
            Some(_) => Err(CaptureError::device(step, "buffer moved after prepare")),
            None => Err(CaptureError::device(step, "no buffer prepared")),
        }
    }
}

/// Capture device backed by a synthetic signal.
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    signal: SimulatedSignal,
    pacing: Pacing,
    captured_limit: Option<usize>,
    failing: Vec<DeviceStep>,
    busy: bool,
    log: CallLog,
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self {
            signal: SimulatedSignal::Silence,
            pacing: Pacing::Instant,
            captured_limit: None,
            failing: Vec::new(),
            busy: false,
            log: CallLog::default(),
        }
    }

    pub fn with_signal(mut self, signal: SimulatedSignal) -> Self {
        self.signal = signal;
        self
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Cap the bytes delivered before stop, as if stopped early.
    pub fn with_captured_limit(mut self, bytes: usize) -> Self {
        self.captured_limit = Some(bytes);
        self
    }

    /// Make `step` fail with the error that step maps to. May be repeated.
    pub fn failing_at(mut self, step: DeviceStep) -> Self {
        self.failing.push(step);
        self
    }

    /// Make `open` fail as if another process held the device.
    pub fn busy(mut self) -> Self {
        self.busy = true;
        self
    }

    pub fn call_log(&self) -> CallLog {
        self.log.clone()
    }

    fn enter(&self, step: DeviceStep) -> Result<(), CaptureError> {
        self.log.record(step);
        if self.failing.contains(&step) {
            return Err(CaptureError::device(step, "simulated failure"));
        }
        Ok(())
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureDevice for SimulatedDevice {
    type Handle = SimulatedHandle;

    fn open(&mut self, format: &AudioFormat) -> Result<SimulatedHandle, CaptureError> {
        self.enter(DeviceStep::Open)?;
        if self.busy {
            return Err(CaptureError::DeviceNotAvailable("device is already in use".into()));
        }
        self.log.inner.lock().live_handles += 1;
        Ok(SimulatedHandle {
            format: *format,
            buffer_addr: None,
            queued: false,
            started_at: None,
        })
    }

    fn prepare_buffer(&mut self, handle: &mut SimulatedHandle, buffer: &mut [u8]) -> Result<(), CaptureError> {
        self.enter(DeviceStep::Prepare)?;
        if handle.buffer_addr.is_some() {
            return Err(CaptureError::PrepareFailed("buffer already prepared".into()));
        }
        if buffer.is_empty() {
            return Err(CaptureError::PrepareFailed("buffer is empty".into()));
        }
        handle.buffer_addr = Some(buffer.as_ptr() as usize);
        Ok(())
    }

    fn submit(&mut self, handle: &mut SimulatedHandle, buffer: &mut [u8]) -> Result<(), CaptureError> {
        self.enter(DeviceStep::Submit)?;
        handle.check_buffer(DeviceStep::Submit, buffer)?;
        handle.queued = true;
        Ok(())
    }

    fn start(&mut self, handle: &mut SimulatedHandle) -> Result<(), CaptureError> {
        self.enter(DeviceStep::Start)?;
        if !handle.queued {
            return Err(CaptureError::StartFailed("no buffer queued".into()));
        }
        handle.started_at = Some(Instant::now());
        Ok(())
    }

    fn stop(&mut self, handle: &mut SimulatedHandle, buffer: &mut [u8]) -> Result<usize, CaptureError> {
        self.enter(DeviceStep::Stop)?;
        handle.check_buffer(DeviceStep::Stop, buffer)?;
        let Some(started_at) = handle.started_at.take() else {
            return Err(CaptureError::StopFailed("device not started".into()));
        };

        let available = match self.pacing {
            Pacing::Instant => buffer.len(),
            Pacing::RealTime => {
                let secs = started_at.elapsed().as_secs_f64();
                (secs * handle.format.byte_rate() as f64) as usize
            }
        };
        let filled = available
            .min(self.captured_limit.unwrap_or(usize::MAX))
            .min(buffer.len());

        let target = &mut buffer[..filled];
        match self.signal {
            SimulatedSignal::Silence => target.fill(0),
            SimulatedSignal::Tone { frequency_hz, amplitude } => {
                if handle.format.bits_per_sample == 16 {
                    pcm::tone_pcm16(
                        target,
                        handle.format.sample_rate,
                        handle.format.channels,
                        frequency_hz,
                        amplitude,
                    );
                } else {
                    target.fill(0);
                }
            }
        }
        handle.queued = false;
        Ok(filled)
    }

    fn release(&mut self, handle: SimulatedHandle, _buffer: &mut [u8]) -> Result<(), CaptureError> {
        self.log.record(DeviceStep::Release);
        // The handle is closed whether or not unpreparing succeeds.
        {
            let mut inner = self.log.inner.lock();
            inner.live_handles = inner.live_handles.saturating_sub(1);
        }
        drop(handle);
        if self.failing.contains(&DeviceStep::Release) {
            return Err(CaptureError::ReleaseFailed("simulated failure".into()));
        }
        Ok(())
    }

    fn device_info(&self) -> AudioSource {
        AudioSource {
            id: "simulated".into(),
            name: "Simulated Input".into(),
            is_default: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enforces_call_order() {
        let mut device = SimulatedDevice::new();
        let mut buffer = vec![0u8; 16];
        let mut handle = device.open(&AudioFormat::CD_STEREO).unwrap();

        assert!(matches!(device.start(&mut handle), Err(CaptureError::StartFailed(_))));
        assert!(matches!(
            device.submit(&mut handle, &mut buffer),
            Err(CaptureError::SubmitFailed(_))
        ));
        device.release(handle, &mut buffer).unwrap();
        assert_eq!(device.call_log().live_handles(), 0);
    }

    #[test]
    fn rejects_moved_buffer() {
        let mut device = SimulatedDevice::new();
        let mut first = vec![0u8; 16];
        let mut second = vec![0u8; 16];
        let mut handle = device.open(&AudioFormat::CD_STEREO).unwrap();
        device.prepare_buffer(&mut handle, &mut first).unwrap();
        assert!(matches!(
            device.submit(&mut handle, &mut second),
            Err(CaptureError::SubmitFailed(_))
        ));
        device.release(handle, &mut first).unwrap();
    }

    #[test]
    fn instant_pacing_fills_tone() {
        let mut device = SimulatedDevice::new().with_signal(SimulatedSignal::Tone {
            frequency_hz: 440.0,
            amplitude: 0.5,
        });
        let mut buffer = vec![0u8; 4000];
        let mut handle = device.open(&AudioFormat::CD_STEREO).unwrap();
        device.prepare_buffer(&mut handle, &mut buffer).unwrap();
        device.submit(&mut handle, &mut buffer).unwrap();
        device.start(&mut handle).unwrap();
        let filled = device.stop(&mut handle, &mut buffer).unwrap();
        device.release(handle, &mut buffer).unwrap();

        assert_eq!(filled, 4000);
        assert!(pcm::peak_level(&buffer) > 0.4);
    }

    #[test]
    fn release_failure_still_closes_handle() {
        let mut device = SimulatedDevice::new().failing_at(DeviceStep::Release);
        let mut buffer = vec![0u8; 16];
        let handle = device.open(&AudioFormat::CD_STEREO).unwrap();
        assert_eq!(device.call_log().live_handles(), 1);
        assert!(matches!(
            device.release(handle, &mut buffer),
            Err(CaptureError::ReleaseFailed(_))
        ));
        assert_eq!(device.call_log().live_handles(), 0);
    }
}
