use clap::Parser;

use wav_recorder_core::{CaptureConfiguration, CaptureError};

/// Record a fixed duration from the default input device to a PCM WAV file
#[derive(Parser, Debug)]
#[command(name = "wav-recorder")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Output WAV file (".wav" is appended if missing)
    #[arg(value_name = "OUTPUT")]
    pub output: String,

    /// Capture length in whole seconds [default: 1]
    #[arg(value_name = "DURATION_SECONDS", allow_negative_numbers = true)]
    pub duration: Option<String>,

    /// Stop early when Enter is pressed
    #[arg(short, long)]
    pub interactive: bool,

    /// Record a synthetic 440 Hz tone instead of a real device
    #[arg(long)]
    pub simulate: bool,

    /// Write a .metadata.json sidecar next to the recording
    #[arg(long)]
    pub metadata: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Validate the arguments into a recording configuration.
    pub fn to_config(&self) -> Result<CaptureConfiguration, CaptureError> {
        let mut config = CaptureConfiguration::from_args(&self.output, self.duration.as_deref())?;
        config.stop_on_enter = self.interactive;
        config.write_metadata = self.metadata;
        Ok(config)
    }
}
