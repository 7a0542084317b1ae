//! Channel de-multiplexing and interleaving over 16-bit PCM blocks.
//!
//! All functions are pure: no side effects, no ownership of the input.
//! Interleaved layout is frame-major: sample 0 is channel 0 of frame 0,
//! sample 1 is channel 1 of frame 0, and so on.

use crate::models::error::DelayError;

/// Extract one channel from an interleaved block.
///
/// Validates that `interleaved.len() == frame_count * channel_count`
/// and that `channel < channel_count`; a mismatch means the device or
/// configuration disagree on block shape and continuing would misalign
/// channels.
pub fn split_channel(
    interleaved: &[i16],
    frame_count: usize,
    channel_count: usize,
    channel: usize,
) -> Result<Vec<i16>, DelayError> {
    let expected = frame_count * channel_count;
    if interleaved.len() != expected {
        return Err(DelayError::Shape {
            expected,
            actual: interleaved.len(),
        });
    }
    if channel >= channel_count {
        return Err(DelayError::InvalidConfig(format!(
            "channel {} out of range for {} channels",
            channel, channel_count
        )));
    }
    Ok(interleaved
        .iter()
        .skip(channel)
        .step_by(channel_count)
        .copied()
        .collect())
}

/// Interleave equal-length channel lanes into one frame-major block.
///
/// For lanes `[u, d, t]` of length F the result is
/// `[u0, d0, t0, u1, d1, t1, ...]`, length `F * lanes.len()`.
pub fn interleave(lanes: &[&[i16]]) -> Result<Vec<i16>, DelayError> {
    let Some(first) = lanes.first() else {
        return Ok(Vec::new());
    };
    let frame_count = first.len();
    for lane in lanes {
        if lane.len() != frame_count {
            return Err(DelayError::Shape {
                expected: frame_count,
                actual: lane.len(),
            });
        }
    }

    let mut out = Vec::with_capacity(frame_count * lanes.len());
    for frame in 0..frame_count {
        for lane in lanes {
            out.push(lane[frame]);
        }
    }
    Ok(out)
}

/// Encode samples as little-endian PCM16 bytes.
pub fn encode_samples(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

/// Decode little-endian PCM16 bytes back to samples.
pub fn decode_samples(bytes: &[u8]) -> Result<Vec<i16>, DelayError> {
    if bytes.len() % 2 != 0 {
        return Err(DelayError::Shape {
            expected: bytes.len() + 1,
            actual: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}
