//! Delayed-feedback session runner.
//!
//! Reads `config.yaml` from the working directory, resolves the
//! configured devices, and runs the delay loop until Ctrl-C. The
//! session is recorded as a 3-channel WAV (user, delayed, original)
//! with a JSON metadata sidecar.

use std::fs;
use std::io::{self, BufRead, Write};
use std::sync::atomic::Ordering;

use anyhow::Context;
use chrono::Local;

use audio_delay_core::storage::metadata;
use audio_delay_core::{recording_path, DelayLoop, SessionConfig};
use audio_delay_cpal::{CpalBlockInput, CpalBlockOutput, DeviceResolver};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let raw = fs::read_to_string("config.yaml").context("failed to read config.yaml")?;
    let config: SessionConfig = serde_yaml::from_str(&raw).context("failed to parse config.yaml")?;
    config
        .validate()
        .map_err(|reason| anyhow::anyhow!("invalid config.yaml: {}", reason))?;

    let path = recording_path(&config.output_dir, config.delay_millis(), Local::now());
    println!("*** filename is {} ***", path.display());
    print!("Press Enter to start recording...");
    io::stdout().flush()?;
    io::stdin().lock().read_line(&mut String::new())?;

    let resolver = DeviceResolver::new();
    let input_device = resolver
        .find_input(&config.input_device)
        .with_context(|| format!("input device '{}'", config.input_device))?;
    let output_device = resolver
        .find_output(&config.output_device)
        .with_context(|| format!("output device '{}'", config.output_device))?;

    let input = CpalBlockInput::open(
        &input_device,
        config.input_channels,
        config.sample_rate,
        config.block_size,
    )?;
    let output = CpalBlockOutput::open(
        &output_device,
        config.output_channels,
        config.sample_rate,
    )?;

    let looper = DelayLoop::new(input, output, config)?;
    let stop = looper.stop_handle();
    ctrlc::set_handler(move || {
        log::info!("interrupt received, stopping after the current cycle");
        stop.store(true, Ordering::SeqCst);
    })
    .context("failed to install Ctrl-C handler")?;

    println!("Recording... press Ctrl-C to stop.");
    let summary = looper.run(&path)?;
    metadata::write_metadata(&summary, &path)?;

    println!(
        "Finished: {} ({} frames, {:.1}s, delay {} ms)",
        summary.file_path.display(),
        summary.frame_count,
        summary.duration_secs,
        summary.delay_millis
    );
    Ok(())
}
