use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::DelayError;
use crate::models::state::RecorderState;
use crate::models::summary::RecordingSummary;
use crate::processing::wav_format;

/// Streaming multi-channel WAV recorder with write-ahead staging.
///
/// The WAV header carries the total data size, which is unknown until
/// the session ends, so frames are appended to a headerless staging
/// file first. `terminate` wraps the staged bytes into the final
/// container in one pass and removes the staging file. This avoids
/// both buffering the whole session in memory and rewriting a growing
/// header on every write.
///
/// ## State machine
///
/// ```text
/// idle → recording → finalized (terminal)
/// ```
///
/// `start` from any state but idle fails with `AlreadyStarted`; `put`
/// and `terminate` outside recording fail with `NotStarted`.
///
/// ## Failure handling
///
/// If finalize fails after staging completed, the staging file is kept
/// on disk and `DelayError::Finalize` names it, so a crashed or
/// interrupted finalize never silently discards recorded audio.
pub struct StagedRecorder {
    stage: Stage,
}

enum Stage {
    Idle,
    Recording(Box<ActiveRecording>),
    Finalized,
}

struct ActiveRecording {
    destination: PathBuf,
    staging_path: PathBuf,
    staging: BufWriter<File>,
    channels: u16,
    sample_width: u16,
    sample_rate: u32,
    bytes_staged: u64,
}

impl StagedRecorder {
    pub fn new() -> Self {
        Self { stage: Stage::Idle }
    }

    pub fn state(&self) -> RecorderState {
        match self.stage {
            Stage::Idle => RecorderState::Idle,
            Stage::Recording(_) => RecorderState::Recording,
            Stage::Finalized => RecorderState::Finalized,
        }
    }

    /// Open a recording session targeting `destination`.
    ///
    /// Creates a uniquely named staging file next to the destination,
    /// opened with exclusive-create semantics. `sample_width` is bytes
    /// per sample.
    pub fn start(
        &mut self,
        destination: impl Into<PathBuf>,
        channels: u16,
        sample_width: u16,
        sample_rate: u32,
    ) -> Result<(), DelayError> {
        if !matches!(self.stage, Stage::Idle) {
            return Err(DelayError::AlreadyStarted);
        }

        let destination = destination.into();
        let staging_dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|e| {
                    DelayError::Storage(format!("failed to create output directory: {}", e))
                })?;
                parent.to_path_buf()
            }
            _ => PathBuf::from("."),
        };

        let staging_path =
            staging_dir.join(format!(".{}.bin", uuid::Uuid::new_v4().simple()));
        let staging = OpenOptions::new()
            .write(true)
            .append(true)
            .create_new(true)
            .open(&staging_path)
            .map_err(|e| DelayError::Storage(format!("failed to create staging file: {}", e)))?;

        log::debug!(
            "recording started: destination={} staging={}",
            destination.display(),
            staging_path.display()
        );

        self.stage = Stage::Recording(Box::new(ActiveRecording {
            destination,
            staging_path,
            staging: BufWriter::new(staging),
            channels,
            sample_width,
            sample_rate,
            bytes_staged: 0,
        }));
        Ok(())
    }

    /// Append one multi-channel frame block, as raw little-endian bytes.
    ///
    /// The bytes are staged verbatim; no frame-shape validation is
    /// performed. Callers own alignment; this permissiveness is
    /// deliberate, matching the byte-oriented staging contract.
    pub fn put(&mut self, frame_bytes: &[u8]) -> Result<(), DelayError> {
        let Stage::Recording(active) = &mut self.stage else {
            return Err(DelayError::NotStarted);
        };
        active
            .staging
            .write_all(frame_bytes)
            .map_err(|e| DelayError::Storage(format!("staging write failed: {}", e)))?;
        active.bytes_staged += frame_bytes.len() as u64;
        Ok(())
    }

    /// Finalize the recording: wrap the staged bytes into a
    /// self-describing WAV file and remove the staging file.
    ///
    /// On success the destination is complete and no staging file
    /// remains. On failure the staging file is preserved and named in
    /// the returned error.
    pub fn terminate(&mut self) -> Result<RecordingSummary, DelayError> {
        let active = match std::mem::replace(&mut self.stage, Stage::Finalized) {
            Stage::Recording(active) => active,
            other => {
                self.stage = other;
                return Err(DelayError::NotStarted);
            }
        };

        let staging_path = active.staging_path.clone();
        finalize(*active).map_err(|reason| {
            log::error!(
                "finalize failed, staging file kept at {}: {}",
                staging_path.display(),
                reason
            );
            DelayError::Finalize {
                staging: staging_path.display().to_string(),
                reason,
            }
        })
    }
}

impl Default for StagedRecorder {
    fn default() -> Self {
        Self::new()
    }
}

fn finalize(active: ActiveRecording) -> Result<RecordingSummary, String> {
    let ActiveRecording {
        destination,
        staging_path,
        staging,
        channels,
        sample_width,
        sample_rate,
        bytes_staged,
    } = active;

    // Close staging for writing.
    let staging_file = staging
        .into_inner()
        .map_err(|e| format!("staging flush failed: {}", e))?;
    staging_file
        .sync_all()
        .map_err(|e| format!("staging sync failed: {}", e))?;
    drop(staging_file);

    let frame_count = bytes_staged / (channels as u64 * sample_width as u64);
    let data_size = wav_data_size(bytes_staged)?;

    let mut reader = BufReader::new(
        File::open(&staging_path).map_err(|e| format!("failed to reopen staging file: {}", e))?,
    );
    let dest_file = File::create(&destination)
        .map_err(|e| format!("failed to create destination: {}", e))?;
    let mut writer = BufWriter::new(dest_file);

    let header = wav_format::generate_wav_header(sample_rate, sample_width, channels, data_size);
    writer
        .write_all(&header)
        .map_err(|e| format!("header write failed: {}", e))?;
    io::copy(&mut reader, &mut writer).map_err(|e| format!("body copy failed: {}", e))?;

    let dest_file = writer
        .into_inner()
        .map_err(|e| format!("destination flush failed: {}", e))?;
    dest_file
        .sync_all()
        .map_err(|e| format!("destination sync failed: {}", e))?;
    drop(dest_file);

    let checksum = sha256_file(&destination)?;

    fs::remove_file(&staging_path)
        .map_err(|e| format!("failed to remove staging file: {}", e))?;

    log::info!(
        "recording finalized: {} ({} frames, {} ch, {} Hz)",
        destination.display(),
        frame_count,
        channels,
        sample_rate
    );

    Ok(RecordingSummary::new(
        destination,
        frame_count,
        channels,
        sample_width,
        sample_rate,
        checksum,
    ))
}

/// WAV sizes are 32-bit; the RIFF chunk size adds 36 bytes of header
/// overhead on top of the data size. Staging beyond that cannot be
/// represented in the container, so finalize refuses (keeping the
/// staging file) instead of writing a truncated size field.
const MAX_WAV_DATA_SIZE: u64 = u32::MAX as u64 - 36;

fn wav_data_size(bytes_staged: u64) -> Result<u32, String> {
    if bytes_staged > MAX_WAV_DATA_SIZE {
        return Err(format!(
            "staged {} bytes exceed the WAV size limit of {}",
            bytes_staged, MAX_WAV_DATA_SIZE
        ));
    }
    Ok(bytes_staged as u32)
}

/// Compute SHA-256 hex digest of a file, streaming.
fn sha256_file(path: &Path) -> Result<String, String> {
    let mut file =
        File::open(path).map_err(|e| format!("failed to read file for checksum: {}", e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| format!("checksum read failed: {}", e))?;
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
