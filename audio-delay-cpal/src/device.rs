//! Device enumeration and fuzzy name matching.
//!
//! Configured device names rarely match the platform's full device
//! strings character for character, so resolution picks the closest
//! name by bigram similarity over the enumerated device list.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};

use audio_delay_core::DelayError;

/// Similarity below this is treated as "no such device".
pub const DEFAULT_CUTOFF: f64 = 0.2;

/// Resolves configured device names against the default cpal host.
pub struct DeviceResolver {
    host: Host,
}

impl DeviceResolver {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// Names of all input devices, in enumeration order.
    pub fn input_device_names(&self) -> Vec<String> {
        self.host
            .input_devices()
            .map(collect_names)
            .unwrap_or_default()
    }

    /// Names of all output devices, in enumeration order.
    pub fn output_device_names(&self) -> Vec<String> {
        self.host
            .output_devices()
            .map(collect_names)
            .unwrap_or_default()
    }

    /// Find the input device whose name is closest to `name`.
    pub fn find_input(&self, name: &str) -> Result<Device, DelayError> {
        let devices: Vec<Device> = self
            .host
            .input_devices()
            .map_err(|e| DelayError::DeviceOpen(format!("input enumeration failed: {}", e)))?
            .collect();
        find_closest(name, devices)
    }

    /// Find the output device whose name is closest to `name`.
    pub fn find_output(&self, name: &str) -> Result<Device, DelayError> {
        let devices: Vec<Device> = self
            .host
            .output_devices()
            .map_err(|e| DelayError::DeviceOpen(format!("output enumeration failed: {}", e)))?
            .collect();
        find_closest(name, devices)
    }
}

impl Default for DeviceResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_names(devices: impl Iterator<Item = Device>) -> Vec<String> {
    devices.filter_map(|d| d.name().ok()).collect()
}

fn find_closest(name: &str, devices: Vec<Device>) -> Result<Device, DelayError> {
    let names: Vec<String> = devices
        .iter()
        .map(|d| d.name().unwrap_or_default())
        .collect();
    let index = best_match(name, &names, DEFAULT_CUTOFF)
        .ok_or_else(|| DelayError::DeviceNotFound(name.to_string()))?;
    log::info!("device '{}' resolved to '{}'", name, names[index]);
    Ok(devices.into_iter().nth(index).unwrap_or_else(|| {
        unreachable!("index came from enumerating the same list")
    }))
}

/// Index of the candidate most similar to `wanted`, or `None` when the
/// best similarity falls below `cutoff`.
pub fn best_match(wanted: &str, candidates: &[String], cutoff: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let score = similarity(wanted, candidate);
        if score >= cutoff && best.map_or(true, |(_, s)| score > s) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}

/// Case-insensitive bigram similarity in `[0.0, 1.0]`.
///
/// Dice coefficient over character bigram multisets: `2 * |common| /
/// (|a| + |b|)`. Single-character strings fall back to exact
/// comparison.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a == b {
        return if a.is_empty() { 0.0 } else { 1.0 };
    }

    let mut left = bigrams(&a);
    let right = bigrams(&b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let total = left.len() + right.len();
    let mut common = 0usize;
    for pair in &right {
        if let Some(pos) = left.iter().position(|p| p == pair) {
            left.swap_remove(pos);
            common += 1;
        }
    }
    2.0 * common as f64 / total as f64
}

fn bigrams(s: &str) -> Vec<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}
