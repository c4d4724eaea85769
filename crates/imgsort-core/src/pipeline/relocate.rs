//! File transfer into the destination tree.
//!
//! Move mode renames when source and destination share a filesystem and
//! otherwise copies, verifies and removes the source. Copy mode stops after
//! verification. A failed verification never leaves a partial destination
//! behind and never touches the source.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use crate::config::{PipelineConfig, ProcessingConfig, TransferMode};
use crate::error::RelocateError;

use super::retry;

/// Byte-level copy used by the copy path.
type CopyFn = fn(&Path, &Path) -> io::Result<u64>;

fn fs_copy(source: &Path, destination: &Path) -> io::Result<u64> {
    fs::copy(source, destination)
}

/// Transfers single files with verification and retry.
#[derive(Debug, Clone)]
pub struct Relocator {
    mode: TransferMode,
    retry_attempts: u32,
    retry_delay_ms: u64,
    copy_file: CopyFn,
}

impl Relocator {
    pub fn new(processing: &ProcessingConfig, pipeline: &PipelineConfig) -> Self {
        Self {
            mode: processing.transfer_mode,
            retry_attempts: pipeline.retry_attempts,
            retry_delay_ms: pipeline.retry_delay_ms,
            copy_file: fs_copy,
        }
    }

    #[cfg(test)]
    fn with_copy_fn(mut self, copy_file: CopyFn) -> Self {
        self.copy_file = copy_file;
        self
    }

    /// Transfer `source` to `destination`, creating missing directories.
    pub fn relocate(&self, source: &Path, destination: &Path) -> Result<(), RelocateError> {
        if !source.is_file() {
            return Err(RelocateError::SourceVanished(source.to_path_buf()));
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| RelocateError::DestinationUnwritable {
                path: parent.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        match self.mode {
            TransferMode::Move => {
                if fs::rename(source, destination).is_ok() {
                    tracing::debug!("Moved {:?} -> {:?}", source, destination);
                    return Ok(());
                }
                // Cross-device or otherwise not renameable: copy instead
                self.copy_with_retry(source, destination)?;
                if let Err(e) = fs::remove_file(source) {
                    tracing::warn!(
                        "Copied {:?} but could not remove the source: {}",
                        source,
                        e
                    );
                }
                tracing::debug!("Moved (copy) {:?} -> {:?}", source, destination);
                Ok(())
            }
            TransferMode::Copy => {
                self.copy_with_retry(source, destination)?;
                tracing::debug!("Copied {:?} -> {:?}", source, destination);
                Ok(())
            }
        }
    }

    /// Copy with exponential backoff between attempts.
    fn copy_with_retry(&self, source: &Path, destination: &Path) -> Result<(), RelocateError> {
        let mut attempt = 0;
        loop {
            match copy_verified(self.copy_file, source, destination) {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < self.retry_attempts => {
                    let delay = retry::backoff_duration(attempt, self.retry_delay_ms);
                    attempt += 1;
                    tracing::warn!(
                        "Copy attempt {attempt}/{} failed for {:?}: {e}; retrying in {delay:?}",
                        self.retry_attempts + 1,
                        source
                    );
                    std::thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Copy `source` to `destination` and check the result.
///
/// On any failure the destination file is removed before returning.
fn copy_verified(
    copy_file: CopyFn,
    source: &Path,
    destination: &Path,
) -> Result<(), RelocateError> {
    let source_meta =
        fs::metadata(source).map_err(|_| RelocateError::SourceVanished(source.to_path_buf()))?;
    let expected = source_meta.len();

    if let Err(e) = copy_file(source, destination) {
        discard_partial(destination);
        if e.kind() == io::ErrorKind::NotFound && !source.exists() {
            return Err(RelocateError::SourceVanished(source.to_path_buf()));
        }
        return Err(RelocateError::DestinationUnwritable {
            path: destination.to_path_buf(),
            reason: e.to_string(),
        });
    }

    if let Err(reason) = verify_copy(destination, expected) {
        discard_partial(destination);
        return Err(RelocateError::CopyVerificationFailed {
            path: destination.to_path_buf(),
            reason,
        });
    }

    // Keep the source modification time so a re-run classifies the same way
    if let Ok(modified) = source_meta.modified() {
        let restored = File::options()
            .write(true)
            .open(destination)
            .and_then(|f| f.set_modified(modified));
        if let Err(e) = restored {
            tracing::debug!("Could not preserve mtime on {:?}: {}", destination, e);
        }
    }

    Ok(())
}

/// Destination must be readable and exactly as long as the source.
fn verify_copy(destination: &Path, expected: u64) -> Result<(), String> {
    let file = File::open(destination).map_err(|e| format!("copy not readable: {e}"))?;
    let actual = file
        .metadata()
        .map_err(|e| format!("copy metadata unavailable: {e}"))?
        .len();
    if actual != expected {
        return Err(format!("size mismatch: expected {expected} bytes, found {actual}"));
    }
    Ok(())
}

fn discard_partial(destination: &Path) {
    if destination.exists() {
        if let Err(e) = fs::remove_file(destination) {
            tracing::error!("Failed to remove partial copy {:?}: {}", destination, e);
        }
    }
}
