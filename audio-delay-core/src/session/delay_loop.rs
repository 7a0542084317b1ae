use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::models::config::SessionConfig;
use crate::models::error::DelayError;
use crate::models::state::LoopState;
use crate::models::summary::RecordingSummary;
use crate::processing::delay_queue::DelayQueue;
use crate::processing::demux;
use crate::storage::staged_recorder::StagedRecorder;
use crate::traits::stream::{BlockInput, BlockOutput};

/// Recorded channels: user, delayed target, original target.
pub const RECORD_CHANNELS: u16 = 3;

/// Build the recording path: `{output_dir}/{YYYYMMDDHHMMSS}_{delay_ms:06}.wav`.
///
/// The timestamp is taken at session start; the delay is zero-padded
/// milliseconds.
pub fn recording_path(
    output_dir: &Path,
    delay_millis: u64,
    timestamp: DateTime<Local>,
) -> PathBuf {
    output_dir.join(format!(
        "{}_{:06}.wav",
        timestamp.format("%Y%m%d%H%M%S"),
        delay_millis
    ))
}

/// Single-threaded delayed-feedback loop.
///
/// Each cycle pulls one interleaved block from the input, demuxes the
/// user and target channels, rotates the target block through the
/// delay queue (push, then pop of the same cycle), plays the popped
/// block, and records `[user, delayed, original]` as one 3-channel
/// frame block.
///
/// ```text
/// input ─→ demux ─┬─ user ────────────────────────┐
///                 └─ target ─→ DelayQueue ─→ playback ─→ output
///                       │                       │       │
///                       └──────→ StagedRecorder ←───────┘
/// ```
///
/// States: setup → running → stopped. Stopping is cooperative: the
/// flag from `stop_handle` is checked at every cycle boundary. On any
/// exit (requested stop or fatal error) shutdown stops and closes
/// both streams and finalizes the recorder, attempting every step even
/// if an earlier one fails, so a partial session still ends up as a
/// valid WAV file.
pub struct DelayLoop<I: BlockInput, O: BlockOutput> {
    input: I,
    output: O,
    queue: DelayQueue,
    recorder: StagedRecorder,
    config: SessionConfig,
    stop: Arc<AtomicBool>,
    state: LoopState,
}

impl<I: BlockInput, O: BlockOutput> DelayLoop<I, O> {
    pub fn new(input: I, output: O, config: SessionConfig) -> Result<Self, DelayError> {
        config.validate().map_err(DelayError::InvalidConfig)?;
        let queue = DelayQueue::new(
            config.delay_secs,
            config.sample_rate,
            config.block_size,
            0,
        );
        Ok(Self {
            input,
            output,
            queue,
            recorder: StagedRecorder::new(),
            config,
            stop: Arc::new(AtomicBool::new(false)),
            state: LoopState::Setup,
        })
    }

    /// Flag observed between cycles; set it (e.g. from a Ctrl-C
    /// handler) to request an orderly stop.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Number of pre-filled delay blocks.
    pub fn delay_depth(&self) -> usize {
        self.queue.depth()
    }

    /// Run until stopped or a fatal error, then shut down and finalize.
    ///
    /// Consuming `self` releases both device handles exactly once on
    /// every exit path. The recording at `destination` is completed
    /// with a correct header even when the loop ends in an error; in
    /// that case the error is returned and the finalized file is only
    /// logged.
    pub fn run(mut self, destination: impl Into<PathBuf>) -> Result<RecordingSummary, DelayError> {
        self.recorder.start(
            destination,
            RECORD_CHANNELS,
            self.config.sample_width as u16,
            self.config.sample_rate,
        )?;
        self.state = LoopState::Running;
        log::info!(
            "delay loop running: delay depth {} blocks of {} frames",
            self.queue.depth(),
            self.config.block_size
        );

        let mut loop_err = None;
        while !self.stop.load(Ordering::SeqCst) {
            if let Err(e) = self.cycle() {
                log::error!("cycle failed: {}", e);
                loop_err = Some(e);
                break;
            }
        }
        self.state = LoopState::Stopped;
        log::info!("delay loop stopped");
        self.shutdown(loop_err)
    }

    fn cycle(&mut self) -> Result<(), DelayError> {
        let frames = self.config.block_size;
        let channels = self.config.input_channels;

        let interleaved = self.input.read_block()?;
        let user = demux::split_channel(&interleaved, frames, channels, self.config.user_channel)?;
        let target =
            demux::split_channel(&interleaved, frames, channels, self.config.target_channel)?;

        // Push-then-pop of the same cycle; the pre-fill supplies the
        // delay depth.
        let playback = self.queue.rotate(target.clone());

        self.output.write_block(&playback)?;

        let record = demux::interleave(&[&user, &playback, &target])?;
        self.recorder.put(&demux::encode_samples(&record))
    }

    /// Orderly release: stop both streams, close both streams, finalize
    /// the recorder. Every step is attempted; the first error wins but
    /// never short-circuits the rest.
    fn shutdown(mut self, mut first_err: Option<DelayError>) -> Result<RecordingSummary, DelayError> {
        let steps = [
            ("input stop", self.input.stop()),
            ("output stop", self.output.stop()),
            ("input close", self.input.close()),
            ("output close", self.output.close()),
        ];
        for (step, result) in steps {
            if let Err(e) = result {
                log::warn!("{} failed during shutdown: {}", step, e);
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }

        match (first_err, self.recorder.terminate()) {
            (None, Ok(mut summary)) => {
                summary.delay_millis = self.config.delay_millis();
                Ok(summary)
            }
            (None, Err(e)) => Err(e),
            (Some(e), Ok(summary)) => {
                log::info!(
                    "session ended in error; recording finalized at {}",
                    summary.file_path.display()
                );
                Err(e)
            }
            (Some(e), Err(term_err)) => {
                log::error!("finalize also failed: {}", term_err);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;

    /// Input fake: serves queued blocks, sets the stop flag once drained
    /// so `run` exits after the last block.
    struct ScriptedInput {
        blocks: Vec<Vec<i16>>,
        next: usize,
        fail_at: Option<usize>,
        stop: Rc<RefCell<Option<Arc<AtomicBool>>>>,
        stops: Rc<RefCell<u32>>,
        closes: Rc<RefCell<u32>>,
    }

    impl BlockInput for ScriptedInput {
        fn read_block(&mut self) -> Result<Vec<i16>, DelayError> {
            if self.fail_at == Some(self.next) {
                return Err(DelayError::Stream("simulated input failure".into()));
            }
            let block = self.blocks[self.next].clone();
            self.next += 1;
            if self.next == self.blocks.len() {
                if let Some(flag) = self.stop.borrow().as_ref() {
                    flag.store(true, Ordering::SeqCst);
                }
            }
            Ok(block)
        }

        fn stop(&mut self) -> Result<(), DelayError> {
            *self.stops.borrow_mut() += 1;
            Ok(())
        }

        fn close(&mut self) -> Result<(), DelayError> {
            *self.closes.borrow_mut() += 1;
            Ok(())
        }
    }

    struct CapturingOutput {
        written: Rc<RefCell<Vec<Vec<i16>>>>,
        stops: Rc<RefCell<u32>>,
        closes: Rc<RefCell<u32>>,
        fail_stop: bool,
    }

    impl BlockOutput for CapturingOutput {
        fn write_block(&mut self, samples: &[i16]) -> Result<(), DelayError> {
            self.written.borrow_mut().push(samples.to_vec());
            Ok(())
        }

        fn stop(&mut self) -> Result<(), DelayError> {
            *self.stops.borrow_mut() += 1;
            if self.fail_stop {
                return Err(DelayError::Stream("simulated stop failure".into()));
            }
            Ok(())
        }

        fn close(&mut self) -> Result<(), DelayError> {
            *self.closes.borrow_mut() += 1;
            Ok(())
        }
    }

    fn test_config(dir: &Path) -> SessionConfig {
        SessionConfig {
            input_channels: 2,
            output_channels: 1,
            sample_rate: 8,
            block_size: 4,
            target_channel: 0,
            user_channel: 1,
            delay_secs: 0.5,
            output_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    /// Interleave a target lane and a user lane into a 2-channel block.
    fn stereo_block(target: [i16; 4], user: [i16; 4]) -> Vec<i16> {
        demux::interleave(&[&target, &user]).unwrap()
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("audio_delay_loop_test_{}", name));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn plays_delayed_blocks_and_records_three_channels() {
        let dir = temp_dir("e2e");
        let written = Rc::new(RefCell::new(Vec::new()));
        let counters = (
            Rc::new(RefCell::new(0)),
            Rc::new(RefCell::new(0)),
            Rc::new(RefCell::new(0)),
            Rc::new(RefCell::new(0)),
        );
        let stop_slot = Rc::new(RefCell::new(None));

        let input = ScriptedInput {
            blocks: vec![
                stereo_block([1, 2, 3, 4], [101, 102, 103, 104]),
                stereo_block([5, 6, 7, 8], [105, 106, 107, 108]),
                stereo_block([9, 10, 11, 12], [109, 110, 111, 112]),
            ],
            next: 0,
            fail_at: None,
            stop: Rc::clone(&stop_slot),
            stops: Rc::clone(&counters.0),
            closes: Rc::clone(&counters.1),
        };
        let output = CapturingOutput {
            written: Rc::clone(&written),
            stops: Rc::clone(&counters.2),
            closes: Rc::clone(&counters.3),
            fail_stop: false,
        };

        let looper = DelayLoop::new(input, output, test_config(&dir)).unwrap();
        assert_eq!(looper.delay_depth(), 1); // floor(0.5 * 8 / 4)
        assert_eq!(looper.state(), LoopState::Setup);
        *stop_slot.borrow_mut() = Some(looper.stop_handle());

        let path = dir.join("session.wav");
        let summary = looper.run(&path).unwrap();

        // Playback is the target lane delayed by one block.
        assert_eq!(
            *written.borrow(),
            vec![
                vec![0, 0, 0, 0],
                vec![1, 2, 3, 4],
                vec![5, 6, 7, 8],
            ]
        );

        // Each device stopped and closed exactly once.
        assert_eq!(*counters.0.borrow(), 1);
        assert_eq!(*counters.1.borrow(), 1);
        assert_eq!(*counters.2.borrow(), 1);
        assert_eq!(*counters.3.borrow(), 1);

        assert_eq!(summary.frame_count, 12);
        assert_eq!(summary.channels, 3);
        assert_eq!(summary.delay_millis, 500);

        // Recorded frames are [user, delayed, original], per frame.
        let file_data = fs::read(&path).unwrap();
        let body = demux::decode_samples(&file_data[44..]).unwrap();
        let expected_first_cycle =
            demux::interleave(&[&[101, 102, 103, 104], &[0, 0, 0, 0], &[1, 2, 3, 4]]).unwrap();
        assert_eq!(&body[..12], &expected_first_cycle[..]);
        let expected_second_cycle =
            demux::interleave(&[&[105, 106, 107, 108], &[1, 2, 3, 4], &[5, 6, 7, 8]]).unwrap();
        assert_eq!(&body[12..24], &expected_second_cycle[..]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn input_failure_still_finalizes_recording() {
        let dir = temp_dir("input_failure");
        let written = Rc::new(RefCell::new(Vec::new()));
        let in_stops = Rc::new(RefCell::new(0));
        let in_closes = Rc::new(RefCell::new(0));
        let out_stops = Rc::new(RefCell::new(0));
        let out_closes = Rc::new(RefCell::new(0));

        let input = ScriptedInput {
            blocks: vec![
                stereo_block([1, 2, 3, 4], [0, 0, 0, 0]),
                stereo_block([5, 6, 7, 8], [0, 0, 0, 0]),
            ],
            next: 0,
            fail_at: Some(1), // second read fails
            stop: Rc::new(RefCell::new(None)),
            stops: Rc::clone(&in_stops),
            closes: Rc::clone(&in_closes),
        };
        let output = CapturingOutput {
            written: Rc::clone(&written),
            stops: Rc::clone(&out_stops),
            closes: Rc::clone(&out_closes),
            fail_stop: false,
        };

        let looper = DelayLoop::new(input, output, test_config(&dir)).unwrap();
        let path = dir.join("partial.wav");
        let err = looper.run(&path).unwrap_err();
        assert_eq!(err, DelayError::Stream("simulated input failure".into()));

        // One full cycle ran before the failure; the file is complete
        // and self-describing.
        let file_data = fs::read(&path).unwrap();
        assert_eq!(&file_data[0..4], b"RIFF");
        assert_eq!(
            u32::from_le_bytes([file_data[40], file_data[41], file_data[42], file_data[43]]),
            24 // one block of 4 frames * 3 channels * 2 bytes
        );

        // Shutdown still released everything exactly once.
        assert_eq!(*in_stops.borrow(), 1);
        assert_eq!(*in_closes.borrow(), 1);
        assert_eq!(*out_stops.borrow(), 1);
        assert_eq!(*out_closes.borrow(), 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn shutdown_step_failure_does_not_skip_later_steps() {
        let dir = temp_dir("shutdown_failure");
        let in_stops = Rc::new(RefCell::new(0));
        let in_closes = Rc::new(RefCell::new(0));
        let out_stops = Rc::new(RefCell::new(0));
        let out_closes = Rc::new(RefCell::new(0));
        let stop_slot = Rc::new(RefCell::new(None));

        let input = ScriptedInput {
            blocks: vec![stereo_block([1, 2, 3, 4], [0, 0, 0, 0])],
            next: 0,
            fail_at: None,
            stop: Rc::clone(&stop_slot),
            stops: Rc::clone(&in_stops),
            closes: Rc::clone(&in_closes),
        };
        let output = CapturingOutput {
            written: Rc::new(RefCell::new(Vec::new())),
            stops: Rc::clone(&out_stops),
            closes: Rc::clone(&out_closes),
            fail_stop: true,
        };

        let looper = DelayLoop::new(input, output, test_config(&dir)).unwrap();
        *stop_slot.borrow_mut() = Some(looper.stop_handle());
        let path = dir.join("shutdown.wav");
        let err = looper.run(&path).unwrap_err();
        assert_eq!(err, DelayError::Stream("simulated stop failure".into()));

        // Close ran despite the stop failure, and the file was finalized.
        assert_eq!(*in_closes.borrow(), 1);
        assert_eq!(*out_closes.borrow(), 1);
        assert!(fs::read(&path).unwrap().len() >= 44);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rejects_invalid_config() {
        let input = ScriptedInput {
            blocks: Vec::new(),
            next: 0,
            fail_at: None,
            stop: Rc::new(RefCell::new(None)),
            stops: Rc::new(RefCell::new(0)),
            closes: Rc::new(RefCell::new(0)),
        };
        let output = CapturingOutput {
            written: Rc::new(RefCell::new(Vec::new())),
            stops: Rc::new(RefCell::new(0)),
            closes: Rc::new(RefCell::new(0)),
            fail_stop: false,
        };
        let config = SessionConfig {
            block_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            DelayLoop::new(input, output, config),
            Err(DelayError::InvalidConfig(_))
        ));
    }

    #[test]
    fn recording_path_convention() {
        use chrono::TimeZone;

        let ts = Local.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap();
        let path = recording_path(Path::new("recordings"), 250, ts);
        assert_eq!(
            path,
            PathBuf::from("recordings/20260314150926_000250.wav")
        );
    }
}
