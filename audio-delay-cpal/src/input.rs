use std::collections::VecDeque;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;

use audio_delay_core::{BlockInput, DelayError};

/// Capture-side counters shared with the cpal callback thread.
#[derive(Debug, Default, Clone)]
pub struct InputStats {
    pub callbacks: u64,
    pub samples: u64,
    /// Buffers dropped because the loop fell behind. Overrun is
    /// tolerated, never raised.
    pub overruns: u64,
}

/// Buffered capture chunks between the callback and `read_block`.
const CHANNEL_CAPACITY: usize = 64;

/// Blocking block reader over a cpal input stream.
///
/// cpal delivers audio on its own callback thread; a bounded channel
/// bridges those buffers to the single-threaded loop, which is the
/// synchronization the core's pull-based contract asks backends to
/// provide. `read_block` reassembles callback buffers into exactly
/// `block_size * channels` samples regardless of the callback's own
/// buffer size.
pub struct CpalBlockInput {
    stream: Option<Stream>,
    receiver: Receiver<Vec<i16>>,
    pending: VecDeque<i16>,
    samples_per_block: usize,
    stats: Arc<Mutex<InputStats>>,
}

impl CpalBlockInput {
    pub fn open(
        device: &Device,
        channels: usize,
        sample_rate: u32,
        block_size: usize,
    ) -> Result<Self, DelayError> {
        let default = device
            .default_input_config()
            .map_err(|e| DelayError::DeviceOpen(format!("no default input config: {}", e)))?;
        let sample_format = default.sample_format();

        let config = StreamConfig {
            channels: channels as u16,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let (sender, receiver) = bounded::<Vec<i16>>(CHANNEL_CAPACITY);
        let stats = Arc::new(Mutex::new(InputStats::default()));
        let stream = build_stream(device, &config, sample_format, sender, Arc::clone(&stats))?;
        stream
            .play()
            .map_err(|e| DelayError::DeviceOpen(format!("failed to start input stream: {}", e)))?;

        log::debug!(
            "input stream open: {} ch, {} Hz, {:?}",
            channels,
            sample_rate,
            sample_format
        );

        Ok(Self {
            stream: Some(stream),
            receiver,
            pending: VecDeque::new(),
            samples_per_block: block_size * channels,
            stats,
        })
    }

    pub fn stats(&self) -> InputStats {
        self.stats.lock().clone()
    }
}

impl BlockInput for CpalBlockInput {
    fn read_block(&mut self) -> Result<Vec<i16>, DelayError> {
        while self.pending.len() < self.samples_per_block {
            let chunk = self
                .receiver
                .recv()
                .map_err(|_| DelayError::Stream("input stream disconnected".into()))?;
            self.pending.extend(chunk);
        }
        Ok(self.pending.drain(..self.samples_per_block).collect())
    }

    fn stop(&mut self) -> Result<(), DelayError> {
        if let Some(stream) = &self.stream {
            stream
                .pause()
                .map_err(|e| DelayError::Stream(format!("failed to stop input stream: {}", e)))?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), DelayError> {
        if self.stream.take().is_some() {
            let stats = self.stats.lock();
            log::info!(
                "input stream closed: {} callbacks, {} samples, {} overruns",
                stats.callbacks,
                stats.samples,
                stats.overruns
            );
        }
        Ok(())
    }
}

fn build_stream(
    device: &Device,
    config: &StreamConfig,
    sample_format: SampleFormat,
    sender: Sender<Vec<i16>>,
    stats: Arc<Mutex<InputStats>>,
) -> Result<Stream, DelayError> {
    let err_fn = |err: cpal::StreamError| {
        log::error!("input stream error: {}", err);
    };

    let deliver = move |samples: Vec<i16>| {
        let mut s = stats.lock();
        s.callbacks += 1;
        s.samples += samples.len() as u64;
        match sender.try_send(samples) {
            Ok(()) => {}
            // Loop fell behind; drop the buffer and keep capturing.
            Err(TrySendError::Full(_)) => s.overruns += 1,
            Err(TrySendError::Disconnected(_)) => {}
        }
    };

    let stream = match sample_format {
        SampleFormat::I16 => device
            .build_input_stream(
                config,
                move |data: &[i16], _: &_| deliver(data.to_vec()),
                err_fn,
                None,
            )
            .map_err(|e| DelayError::DeviceOpen(format!("failed to open input stream: {}", e)))?,
        SampleFormat::F32 => device
            .build_input_stream(
                config,
                move |data: &[f32], _: &_| {
                    let converted = data
                        .iter()
                        .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0).round() as i16)
                        .collect();
                    deliver(converted);
                },
                err_fn,
                None,
            )
            .map_err(|e| DelayError::DeviceOpen(format!("failed to open input stream: {}", e)))?,
        other => {
            return Err(DelayError::DeviceOpen(format!(
                "unsupported input sample format: {:?}",
                other
            )))
        }
    };
    Ok(stream)
}
