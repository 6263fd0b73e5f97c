use std::sync::Arc;
use std::time::Duration;

use crate::models::audio_models::AudioSource;
use crate::models::error::CaptureError;
use crate::models::state::CaptureState;
use crate::processing::capture_buffer::CaptureBuffer;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::capture_device::CaptureDevice;
use crate::traits::stop_signal::{StopSignal, WaitOutcome};

/// What a completed capture produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOutcome {
    /// Frame-aligned bytes of valid audio at the start of the buffer.
    pub bytes_recorded: usize,
    /// The wait was cut short by a manual stop.
    pub interrupted: bool,
}

/// Drives one device through a single capture into a caller-owned buffer.
///
/// The device handle only exists inside [`CaptureController::capture`]; it
/// is acquired and released within the call on every path.
pub struct CaptureController<D: CaptureDevice> {
    device: D,
    delegate: Option<Arc<dyn CaptureDelegate>>,
}

impl<D: CaptureDevice> CaptureController<D> {
    pub fn new(device: D) -> Self {
        Self { device, delegate: None }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_info(&self) -> AudioSource {
        self.device.device_info()
    }

    /// Capture into `buffer` for `duration`, or until `stop` interrupts.
    ///
    /// The device is opened in the buffer's format.
    /// Sequence: open → prepare → submit → start → wait → stop → release.
    /// Any failure is returned after the device has been stopped (if it was
    /// started) and released (if it was opened). The buffer is not touched
    /// by this thread between start and stop.
    pub fn capture(
        &mut self,
        buffer: &mut CaptureBuffer,
        duration: Duration,
        stop: &dyn StopSignal,
    ) -> Result<CaptureOutcome, CaptureError> {
        let delegate = self.delegate.clone();
        let result = self.capture_inner(buffer, duration, stop, delegate.as_deref());
        if let Err(ref e) = result {
            log::error!("capture failed: {}", e);
            if let Some(d) = delegate.as_deref() {
                d.on_error(e);
                d.on_state_changed(&CaptureState::Failed(e.clone()));
            }
        }
        result
    }

    fn capture_inner(
        &mut self,
        buffer: &mut CaptureBuffer,
        duration: Duration,
        stop: &dyn StopSignal,
        delegate: Option<&dyn CaptureDelegate>,
    ) -> Result<CaptureOutcome, CaptureError> {
        if buffer.is_empty() {
            return Err(CaptureError::InvalidArgument("capture buffer is empty".into()));
        }

        let format = buffer.format();
        notify(delegate, CaptureState::Opening);
        log::debug!("opening {} for {:?}", self.device.device_info().name, format);
        let handle = self.device.open(&format)?;

        let mut session = OpenDevice {
            device: &mut self.device,
            handle: Some(handle),
            buffer: buffer.as_mut_slice(),
            started: false,
        };
        session.prepare()?;
        session.submit()?;
        session.start()?;

        notify(
            delegate,
            CaptureState::Capturing {
                duration_secs: u32::try_from(duration.as_secs()).unwrap_or(u32::MAX),
            },
        );
        let waited = stop.wait(duration);
        log::debug!("wait finished: {:?}", waited);

        notify(delegate, CaptureState::Stopping);
        let bytes = session.stop()?;
        session.release()?;

        buffer.set_recorded(bytes);
        Ok(CaptureOutcome {
            bytes_recorded: buffer.recorded_len(),
            interrupted: waited == WaitOutcome::Interrupted,
        })
    }
}

fn notify(delegate: Option<&dyn CaptureDelegate>, state: CaptureState) {
    log::debug!("capture state: {}", state.label());
    if let Some(d) = delegate {
        d.on_state_changed(&state);
    }
}

/// An opened device handle bound to its buffer.
///
/// Dropping it before `release` stops a started device and releases the
/// handle, so every early return after `open` cleans up exactly once.
struct OpenDevice<'a, D: CaptureDevice> {
    device: &'a mut D,
    handle: Option<D::Handle>,
    buffer: &'a mut [u8],
    started: bool,
}

impl<D: CaptureDevice> OpenDevice<'_, D> {
    fn prepare(&mut self) -> Result<(), CaptureError> {
        log::debug!("preparing {} byte buffer", self.buffer.len());
        let handle = self.handle.as_mut().ok_or_else(released)?;
        self.device.prepare_buffer(handle, self.buffer)
    }

    fn submit(&mut self) -> Result<(), CaptureError> {
        log::debug!("submitting buffer");
        let handle = self.handle.as_mut().ok_or_else(released)?;
        self.device.submit(handle, self.buffer)
    }

    fn start(&mut self) -> Result<(), CaptureError> {
        log::debug!("starting capture");
        let handle = self.handle.as_mut().ok_or_else(released)?;
        self.device.start(handle)?;
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<usize, CaptureError> {
        log::debug!("stopping capture");
        self.started = false;
        let handle = self.handle.as_mut().ok_or_else(released)?;
        let bytes = self.device.stop(handle, self.buffer)?;
        log::debug!("device filled {} of {} bytes", bytes, self.buffer.len());
        Ok(bytes)
    }

    fn release(mut self) -> Result<(), CaptureError> {
        log::debug!("releasing device");
        let handle = self.handle.take().ok_or_else(released)?;
        self.device.release(handle, self.buffer)
    }
}

fn released() -> CaptureError {
    CaptureError::ReleaseFailed("device handle already released".into())
}

impl<D: CaptureDevice> Drop for OpenDevice<'_, D> {
    fn drop(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };
        if self.started {
            self.started = false;
            if let Err(e) = self.device.stop(&mut handle, self.buffer) {
                log::warn!("stop during cleanup failed: {}", e);
            }
        }
        if let Err(e) = self.device.release(handle, self.buffer) {
            log::warn!("release during cleanup failed: {}", e);
        }
    }
}
