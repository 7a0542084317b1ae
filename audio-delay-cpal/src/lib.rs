//! # audio-delay-cpal
//!
//! cpal backend for audio-delay-kit.
//!
//! Provides:
//! - `DeviceResolver` — device enumeration with fuzzy name matching
//! - `CpalBlockInput` — blocking block reads over a cpal input stream
//! - `CpalBlockOutput` — blocking block writes over a cpal output stream
//!
//! The `delay-loop` binary ties the backend to the core loop: it loads
//! `config.yaml`, resolves both devices, and runs a delayed-feedback
//! session until Ctrl-C.
//!
//! ## Usage
//! ```ignore
//! use audio_delay_core::DelayLoop;
//! use audio_delay_cpal::{CpalBlockInput, CpalBlockOutput, DeviceResolver};
//!
//! let resolver = DeviceResolver::new();
//! let input_device = resolver.find_input("USB Microphone")?;
//! let output_device = resolver.find_output("Built-in Audio")?;
//! let input = CpalBlockInput::open(&input_device, 2, 16_000, 1024)?;
//! let output = CpalBlockOutput::open(&output_device, 1, 16_000)?;
//! let looper = DelayLoop::new(input, output, config)?;
//! ```

pub mod device;
pub mod input;
pub mod output;

pub use device::{best_match, similarity, DeviceResolver};
pub use input::{CpalBlockInput, InputStats};
pub use output::{CpalBlockOutput, OutputStats};
