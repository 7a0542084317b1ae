use std::collections::VecDeque;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

use audio_delay_core::{BlockOutput, DelayError};

/// Playback-side counters shared with the cpal callback thread.
#[derive(Debug, Default, Clone)]
pub struct OutputStats {
    pub callbacks: u64,
    pub samples: u64,
    /// Frames zero-filled because no block was ready in time.
    pub underruns: u64,
}

/// Queued playback blocks between `write_block` and the callback.
///
/// Small on purpose: the blocking send in `write_block` is what paces
/// the loop against the output device.
const CHANNEL_CAPACITY: usize = 8;

/// Blocking block writer over a cpal output stream.
///
/// `write_block` takes single-channel blocks; the callback broadcasts
/// each sample across all output channels of the device frame.
/// Underrun zero-fills and is counted, never raised.
pub struct CpalBlockOutput {
    stream: Option<Stream>,
    sender: Option<Sender<Vec<i16>>>,
    stats: Arc<Mutex<OutputStats>>,
}

impl CpalBlockOutput {
    pub fn open(
        device: &Device,
        channels: usize,
        sample_rate: u32,
    ) -> Result<Self, DelayError> {
        let default = device
            .default_output_config()
            .map_err(|e| DelayError::DeviceOpen(format!("no default output config: {}", e)))?;
        let sample_format = default.sample_format();

        let config = StreamConfig {
            channels: channels as u16,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let (sender, receiver) = bounded::<Vec<i16>>(CHANNEL_CAPACITY);
        let stats = Arc::new(Mutex::new(OutputStats::default()));
        let stream = build_stream(
            device,
            &config,
            sample_format,
            channels,
            receiver,
            Arc::clone(&stats),
        )?;
        stream
            .play()
            .map_err(|e| DelayError::DeviceOpen(format!("failed to start output stream: {}", e)))?;

        log::debug!(
            "output stream open: {} ch, {} Hz, {:?}",
            channels,
            sample_rate,
            sample_format
        );

        Ok(Self {
            stream: Some(stream),
            sender: Some(sender),
            stats,
        })
    }

    pub fn stats(&self) -> OutputStats {
        self.stats.lock().clone()
    }
}

impl BlockOutput for CpalBlockOutput {
    fn write_block(&mut self, samples: &[i16]) -> Result<(), DelayError> {
        let Some(sender) = &self.sender else {
            return Err(DelayError::Stream("output stream is closed".into()));
        };
        sender
            .send(samples.to_vec())
            .map_err(|_| DelayError::Stream("output stream disconnected".into()))
    }

    fn stop(&mut self) -> Result<(), DelayError> {
        if let Some(stream) = &self.stream {
            stream
                .pause()
                .map_err(|e| DelayError::Stream(format!("failed to stop output stream: {}", e)))?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), DelayError> {
        self.sender.take();
        if self.stream.take().is_some() {
            let stats = self.stats.lock();
            log::info!(
                "output stream closed: {} callbacks, {} samples, {} underruns",
                stats.callbacks,
                stats.samples,
                stats.underruns
            );
        }
        Ok(())
    }
}

fn build_stream(
    device: &Device,
    config: &StreamConfig,
    sample_format: SampleFormat,
    channels: usize,
    receiver: Receiver<Vec<i16>>,
    stats: Arc<Mutex<OutputStats>>,
) -> Result<Stream, DelayError> {
    let err_fn = |err: cpal::StreamError| {
        log::error!("output stream error: {}", err);
    };

    // Carryover between callbacks: one mono sample per output frame.
    let mut carry: VecDeque<i16> = VecDeque::new();
    let mut next_sample = move |stats: &Arc<Mutex<OutputStats>>| -> i16 {
        if carry.is_empty() {
            if let Ok(block) = receiver.try_recv() {
                carry.extend(block);
            }
        }
        match carry.pop_front() {
            Some(sample) => sample,
            None => {
                stats.lock().underruns += 1;
                0
            }
        }
    };

    let stream = match sample_format {
        SampleFormat::I16 => {
            let stats_cb = Arc::clone(&stats);
            device
                .build_output_stream(
                    config,
                    move |data: &mut [i16], _: &_| {
                        {
                            let mut s = stats_cb.lock();
                            s.callbacks += 1;
                            s.samples += data.len() as u64;
                        }
                        for frame in data.chunks_mut(channels) {
                            let sample = next_sample(&stats_cb);
                            frame.fill(sample);
                        }
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| DelayError::DeviceOpen(format!("failed to open output stream: {}", e)))?
        }
        SampleFormat::F32 => {
            let stats_cb = Arc::clone(&stats);
            device
                .build_output_stream(
                    config,
                    move |data: &mut [f32], _: &_| {
                        {
                            let mut s = stats_cb.lock();
                            s.callbacks += 1;
                            s.samples += data.len() as u64;
                        }
                        for frame in data.chunks_mut(channels) {
                            let sample = next_sample(&stats_cb) as f32 / 32768.0;
                            frame.fill(sample);
                        }
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| DelayError::DeviceOpen(format!("failed to open output stream: {}", e)))?
        }
        other => {
            return Err(DelayError::DeviceOpen(format!(
                "unsupported output sample format: {:?}",
                other
            )))
        }
    };
    Ok(stream)
}
