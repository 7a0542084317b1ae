//! # audio-delay-core
//!
//! Platform-agnostic core for delayed-feedback audio sessions.
//!
//! Captures a multi-channel input, routes one channel through a fixed
//! block-delay queue to the output, and records three synchronized
//! channels (live user audio, the delayed signal as played back, and
//! the un-delayed original) into one WAV file. Platform backends
//! implement the `BlockInput`/`BlockOutput` traits and plug into the
//! generic `DelayLoop`.
//!
//! ## Architecture
//!
//! ```text
//! audio-delay-core (this crate)
//! ├── traits/       ← BlockInput, BlockOutput
//! ├── models/       ← DelayError, SessionConfig, RecorderState, RecordingSummary
//! ├── processing/   ← DelayQueue, channel demux, WAV header generation
//! ├── session/      ← DelayLoop (generic orchestrator)
//! └── storage/      ← StagedRecorder, metadata sidecar
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::SessionConfig;
pub use models::error::DelayError;
pub use models::state::{LoopState, RecorderState};
pub use models::summary::RecordingSummary;
pub use processing::delay_queue::DelayQueue;
pub use session::delay_loop::{recording_path, DelayLoop, RECORD_CHANNELS};
pub use storage::staged_recorder::StagedRecorder;
pub use traits::stream::{BlockInput, BlockOutput};
