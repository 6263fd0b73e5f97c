//! waveIn capture device.
//!
//! Records from the default input (`WAVE_MAPPER`) into a single caller-owned
//! buffer using the legacy waveIn API with `CALLBACK_NULL`: the driver
//! fills the buffer on its own threads while the caller sleeps, and the
//! byte count is read back from the `WAVEHDR` after stopping.

use std::mem::size_of;
use std::ptr;

use windows::core::PSTR;
use windows::Win32::Media::Audio::*;
use windows::Win32::Media::MMSYSERR_NOERROR;

use wav_recorder_core::models::audio_models::{AudioFormat, AudioSource};
use wav_recorder_core::models::error::{CaptureError, DeviceStep};
use wav_recorder_core::traits::capture_device::CaptureDevice;

/// Opened waveIn channel and the header describing its buffer.
///
/// The `WAVEHDR` is boxed because the driver keeps its address between
/// `waveInPrepareHeader` and `waveInUnprepareHeader`.
pub struct WaveInHandle {
    hwi: HWAVEIN,
    header: Box<WAVEHDR>,
    prepared: bool,
}

// SAFETY: HWAVEIN is a process-wide handle usable from any thread, and the
// header is only touched by the owning thread and the driver.
unsafe impl Send for WaveInHandle {}

/// waveIn capture device.
pub struct WaveInDevice {
    device_id: u32,
    device_name: String,
}

impl WaveInDevice {
    /// The system default input, as chosen by the wave mapper.
    pub fn default_device() -> Self {
        Self {
            device_id: WAVE_MAPPER,
            device_name: device_name(WAVE_MAPPER).unwrap_or_else(|| "Default Input".into()),
        }
    }
}

impl CaptureDevice for WaveInDevice {
    type Handle = WaveInHandle;

    fn open(&mut self, format: &AudioFormat) -> Result<WaveInHandle, CaptureError> {
        let wave_format = WAVEFORMATEX {
            wFormatTag: WAVE_FORMAT_PCM as u16,
            nChannels: format.channels,
            nSamplesPerSec: format.sample_rate,
            nAvgBytesPerSec: format.byte_rate(),
            nBlockAlign: format.block_align(),
            wBitsPerSample: format.bits_per_sample,
            cbSize: 0,
        };

        let mut hwi = HWAVEIN::default();
        // SAFETY: `hwi` and `wave_format` outlive the call.
        let code = unsafe {
            waveInOpen(
                Some(&mut hwi as *mut HWAVEIN),
                self.device_id,
                &wave_format,
                None,
                None,
                CALLBACK_NULL,
            )
        };
        check(DeviceStep::Open, code)?;
        log::debug!("waveIn opened: {:?}", format);

        Ok(WaveInHandle {
            hwi,
            header: Box::new(WAVEHDR::default()),
            prepared: false,
        })
    }

    fn prepare_buffer(&mut self, handle: &mut WaveInHandle, buffer: &mut [u8]) -> Result<(), CaptureError> {
        let len = u32::try_from(buffer.len())
            .map_err(|_| CaptureError::PrepareFailed(format!("{} byte buffer is too large", buffer.len())))?;

        *handle.header = WAVEHDR {
            lpData: PSTR(buffer.as_mut_ptr()),
            dwBufferLength: len,
            ..Default::default()
        };

        // SAFETY: the header is boxed and the caller keeps `buffer` alive and
        // unmoved until `release`.
        let code = unsafe { waveInPrepareHeader(handle.hwi, &mut *handle.header, size_of::<WAVEHDR>() as u32) };
        check(DeviceStep::Prepare, code)?;
        handle.prepared = true;
        Ok(())
    }

    fn submit(&mut self, handle: &mut WaveInHandle, buffer: &mut [u8]) -> Result<(), CaptureError> {
        if handle.header.lpData.0 != buffer.as_mut_ptr() {
            return Err(CaptureError::SubmitFailed("buffer differs from the prepared one".into()));
        }
        // SAFETY: the header was prepared on this handle.
        let code = unsafe { waveInAddBuffer(handle.hwi, &mut *handle.header, size_of::<WAVEHDR>() as u32) };
        check(DeviceStep::Submit, code)
    }

    fn start(&mut self, handle: &mut WaveInHandle) -> Result<(), CaptureError> {
        // SAFETY: valid open handle.
        let code = unsafe { waveInStart(handle.hwi) };
        check(DeviceStep::Start, code)
    }

    fn stop(&mut self, handle: &mut WaveInHandle, buffer: &mut [u8]) -> Result<usize, CaptureError> {
        // SAFETY: valid open handle.
        let code = unsafe { waveInStop(handle.hwi) };
        check(DeviceStep::Stop, code)?;

        // A partially filled buffer is normally marked done by waveInStop;
        // reset returns it if the driver has not.
        // SAFETY: the driver writes these fields; read them volatile.
        let flags = unsafe { ptr::read_volatile(&handle.header.dwFlags) };
        if flags & WHDR_DONE == 0 {
            // SAFETY: valid open handle.
            let code = unsafe { waveInReset(handle.hwi) };
            check(DeviceStep::Stop, code)?;
        }
        // SAFETY: as above.
        let recorded = unsafe { ptr::read_volatile(&handle.header.dwBytesRecorded) } as usize;
        Ok(recorded.min(buffer.len()))
    }

    fn release(&mut self, handle: WaveInHandle, _buffer: &mut [u8]) -> Result<(), CaptureError> {
        let mut handle = handle;
        let mut result = Ok(());

        if handle.prepared {
            // SAFETY: valid open handle; reset hands back any queued buffer
            // so it can be unprepared.
            unsafe {
                waveInReset(handle.hwi);
            }
            let code =
                unsafe { waveInUnprepareHeader(handle.hwi, &mut *handle.header, size_of::<WAVEHDR>() as u32) };
            result = check(DeviceStep::Release, code);
            handle.prepared = false;
        }

        // Close even if unpreparing failed so the OS handle never leaks.
        // SAFETY: valid open handle, closed exactly once here.
        let code = unsafe { waveInClose(handle.hwi) };
        if let Err(e) = check(DeviceStep::Release, code) {
            log::error!("waveInClose failed: {}", e);
            result = result.and(Err(e));
        }
        result
    }

    fn device_info(&self) -> AudioSource {
        AudioSource {
            id: format!("wavein:{}", self.device_id),
            name: self.device_name.clone(),
            is_default: self.device_id == WAVE_MAPPER,
        }
    }
}

fn check(step: DeviceStep, code: u32) -> Result<(), CaptureError> {
    if code == MMSYSERR_NOERROR {
        Ok(())
    } else {
        Err(CaptureError::device(step, error_text(code)))
    }
}

fn error_text(code: u32) -> String {
    let mut text = [0u16; 256];
    // SAFETY: `text` is a writable buffer of the advertised length.
    let rc = unsafe { waveInGetErrorTextW(code, &mut text) };
    if rc != MMSYSERR_NOERROR {
        return format!("MMRESULT {}", code);
    }
    let len = text.iter().position(|&c| c == 0).unwrap_or(text.len());
    format!("{} (MMRESULT {})", String::from_utf16_lossy(&text[..len]), code)
}

fn device_name(device_id: u32) -> Option<String> {
    let mut caps = WAVEINCAPSW::default();
    // SAFETY: `caps` is a writable WAVEINCAPSW of the advertised size.
    let code = unsafe { waveInGetDevCapsW(device_id as usize, &mut caps, size_of::<WAVEINCAPSW>() as u32) };
    if code != MMSYSERR_NOERROR {
        return None;
    }
    let name = caps.szPname;
    let len = name.iter().position(|&c| c == 0).unwrap_or(name.len());
    Some(String::from_utf16_lossy(&name[..len]))
}
