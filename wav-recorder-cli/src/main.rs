mod cli;
mod console;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use cli::Args;
use console::{spawn_enter_listener, ConsoleDelegate};
use wav_recorder_core::{
    CaptureConfiguration, CaptureDevice, CaptureError, ChannelStop, Pacing, Recorder, RecordingResult,
    SimulatedDevice, SimulatedSignal, TimerStop,
};

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version are not failures.
            let code = if e.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
            let _ = e.print();
            return code;
        }
    };

    init_logging(args.verbose);

    match run(&args) {
        Ok(result) => {
            println!("Recording saved to {}", result.file_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

fn run(args: &Args) -> Result<RecordingResult, CaptureError> {
    let config = args.to_config()?;
    log::info!(
        "recording {} s of {:?} to {}",
        config.duration_secs,
        config.format,
        config.output_path.display()
    );

    if args.simulate {
        let device = SimulatedDevice::new()
            .with_signal(SimulatedSignal::Tone {
                frequency_hz: 440.0,
                amplitude: 0.25,
            })
            .with_pacing(Pacing::RealTime);
        return record_with(device, &config);
    }
    record_default_device(&config)
}

#[cfg(target_os = "windows")]
fn record_default_device(config: &CaptureConfiguration) -> Result<RecordingResult, CaptureError> {
    record_with(wav_recorder_windows::WaveInDevice::default_device(), config)
}

#[cfg(not(target_os = "windows"))]
fn record_default_device(_config: &CaptureConfiguration) -> Result<RecordingResult, CaptureError> {
    Err(CaptureError::DeviceNotAvailable(
        "no audio input backend on this platform (try --simulate)".into(),
    ))
}

fn record_with<D: CaptureDevice>(device: D, config: &CaptureConfiguration) -> Result<RecordingResult, CaptureError> {
    let mut recorder = Recorder::new(device);
    log::info!("input device: {}", recorder.controller().device_info().name);
    recorder.set_delegate(Arc::new(ConsoleDelegate::new(config.stop_on_enter)));

    if config.stop_on_enter {
        let (handle, signal) = ChannelStop::new();
        spawn_enter_listener(handle);
        recorder.record(config, &signal)
    } else {
        recorder.record(config, &TimerStop)
    }
}
