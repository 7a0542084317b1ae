use std::fs;
use std::path::Path;

use crate::models::error::DelayError;
use crate::models::summary::RecordingSummary;

/// Write the recording summary as a JSON sidecar file.
///
/// Creates `{recording}.metadata.json` alongside the recording.
pub fn write_metadata(summary: &RecordingSummary, recording_path: &Path) -> Result<(), DelayError> {
    let metadata_path = recording_path.with_extension("metadata.json");
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| DelayError::Storage(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&metadata_path, json)
        .map_err(|e| DelayError::Storage(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

/// Read a recording summary back from its JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingSummary, DelayError> {
    let metadata_path = recording_path.with_extension("metadata.json");
    let json = fs::read_to_string(&metadata_path)
        .map_err(|e| DelayError::Storage(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json)
        .map_err(|e| DelayError::Storage(format!("failed to parse metadata: {}", e)))
}
