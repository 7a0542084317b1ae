use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Result of a finalized recording session.
///
/// Serializable for the JSON metadata sidecar written next to the
/// recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSummary {
    pub id: String,
    pub file_path: PathBuf,
    pub created_at: String,
    pub frame_count: u64,
    pub duration_secs: f64,
    pub channels: u16,
    pub sample_width: u16,
    pub sample_rate: u32,
    /// Requested delay in milliseconds. The recorder does not know the
    /// delay; the loop fills this in before the summary is reported.
    pub delay_millis: u64,
    pub checksum: String,
}

impl RecordingSummary {
    pub fn new(
        file_path: PathBuf,
        frame_count: u64,
        channels: u16,
        sample_width: u16,
        sample_rate: u32,
        checksum: String,
    ) -> Self {
        let duration_secs = frame_count as f64 / sample_rate as f64;
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_path,
            created_at: chrono::Utc::now().to_rfc3339(),
            frame_count,
            duration_secs,
            channels,
            sample_width,
            sample_rate,
            delay_millis: 0,
            checksum,
        }
    }
}
