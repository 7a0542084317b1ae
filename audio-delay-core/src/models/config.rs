use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for one delayed-feedback session.
///
/// Read once before setup (typically from `config.yaml`) and immutable
/// for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Input device name, matched fuzzily against the device list.
    pub input_device: String,

    /// Output device name, matched fuzzily against the device list.
    pub output_device: String,

    /// Channel count of the input stream.
    pub input_channels: usize,

    /// Channel count of the output stream.
    pub output_channels: usize,

    /// Sample rate in Hz.
    pub sample_rate: u32,

    /// Bytes per sample. The processing path is 16-bit PCM, so this
    /// must be 2.
    pub sample_width: usize,

    /// Frames per processing block.
    pub block_size: usize,

    /// Input channel routed through the delay queue to the output.
    pub target_channel: usize,

    /// Input channel recorded as the live user signal.
    pub user_channel: usize,

    /// Requested delay in seconds. Realized delay is quantized down to
    /// whole blocks: `floor(delay_secs * sample_rate / block_size)`.
    pub delay_secs: f64,

    /// Directory where recordings and metadata sidecars are written.
    pub output_dir: PathBuf,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.block_size == 0 {
            return Err("block size must be positive".into());
        }
        if self.input_channels == 0 || self.output_channels == 0 {
            return Err("channel counts must be positive".into());
        }
        if self.sample_width != 2 {
            return Err(format!("unsupported sample width: {}", self.sample_width));
        }
        if self.target_channel >= self.input_channels {
            return Err(format!(
                "target channel {} out of range for {} input channels",
                self.target_channel, self.input_channels
            ));
        }
        if self.user_channel >= self.input_channels {
            return Err(format!(
                "user channel {} out of range for {} input channels",
                self.user_channel, self.input_channels
            ));
        }
        if self.delay_secs < 0.0 || !self.delay_secs.is_finite() {
            return Err(format!("delay must be nonnegative: {}", self.delay_secs));
        }
        Ok(())
    }

    /// Requested delay in whole milliseconds (used in filenames).
    pub fn delay_millis(&self) -> u64 {
        (self.delay_secs * 1000.0) as u64
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            input_device: String::new(),
            output_device: String::new(),
            input_channels: 2,
            output_channels: 1,
            sample_rate: 16_000,
            sample_width: 2,
            block_size: 1024,
            target_channel: 0,
            user_channel: 1,
            delay_secs: 0.0,
            output_dir: PathBuf::from("."),
        }
    }
}
