use crate::models::error::DelayError;

/// Blocking source of fixed-size interleaved sample blocks.
///
/// Implemented by platform backends (e.g. the cpal adapter). The loop
/// pulls one block per cycle and relies on the device layer's own
/// blocking semantics for pacing; no read timeout is defined.
///
/// Input overrun is a backend concern and must be non-fatal: drop what
/// was lost, log it, and keep delivering blocks. `read_block` only
/// fails when the stream itself is broken.
pub trait BlockInput {
    /// Read one block of `block_size * channels` interleaved samples.
    fn read_block(&mut self) -> Result<Vec<i16>, DelayError>;

    /// Stop the stream. Safe to call more than once.
    fn stop(&mut self) -> Result<(), DelayError>;

    /// Release the underlying device resources. Safe to call more than
    /// once.
    fn close(&mut self) -> Result<(), DelayError>;
}

/// Blocking sink for fixed-size sample blocks.
pub trait BlockOutput {
    /// Write one block; blocks until the device layer accepts it.
    fn write_block(&mut self, samples: &[i16]) -> Result<(), DelayError>;

    /// Stop the stream. Safe to call more than once.
    fn stop(&mut self) -> Result<(), DelayError>;

    /// Release the underlying device resources. Safe to call more than
    /// once.
    fn close(&mut self) -> Result<(), DelayError>;
}
