//! Error types for the `nalscope` crate.
//!
//! Two layers are defined here. [`AcquisitionError`] describes a failure of
//! an external collaborator (a [`MediaSource`](crate::MediaSource)) while it
//! produces frame metadata, elementary stream bytes, or header traces.
//! [`NalscopeError`] is the crate-level error returned by the analyzer and
//! always identifies the file it belongs to.
//!
//! The analysis core itself never fails: empty inputs, streams without start
//! codes, and unknown NAL types all degrade to empty or zero-valued
//! statistics.

use std::{io::Error as IoError, path::PathBuf};

use thiserror::Error;

/// Failure reported by a [`MediaSource`](crate::MediaSource).
///
/// These errors are recoverable at the batch level: the file they belong to
/// is reported as failed and the remaining files are still analyzed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AcquisitionError {
    /// The external tool executable could not be launched.
    #[error("Failed to launch {tool} ({path}): {reason}")]
    ToolNotFound {
        /// Logical tool name (`ffprobe`, `ffmpeg`).
        tool: &'static str,
        /// Executable path that was attempted.
        path: PathBuf,
        /// Underlying reason reported by the operating system.
        reason: String,
    },

    /// The external tool ran but exited unsuccessfully.
    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        /// Logical tool name (`ffprobe`, `ffmpeg`).
        tool: &'static str,
        /// Exit status description.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The tool produced output that could not be interpreted.
    #[error("Malformed output from {tool}: {reason}")]
    MalformedOutput {
        /// Logical tool name.
        tool: &'static str,
        /// What was wrong with the output.
        reason: String,
    },

    /// The input does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The source does not implement the requested acquisition.
    #[error("Unsupported acquisition: {0}")]
    Unsupported(&'static str),

    /// JSON emitted by a tool could not be decoded.
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred while talking to the collaborator.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// An error originating from the FFmpeg libraries.
    #[cfg(feature = "libav")]
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),
}

#[cfg(feature = "libav")]
impl From<ffmpeg_next::Error> for AcquisitionError {
    fn from(error: ffmpeg_next::Error) -> Self {
        AcquisitionError::Ffmpeg(error.to_string())
    }
}

/// The unified error type for all `nalscope` operations.
///
/// Every public method that can fail returns `Result<T, NalscopeError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NalscopeError {
    /// The input file does not exist.
    #[error("File {} not found", .0.display())]
    FileNotFound(PathBuf),

    /// A collaborator failed to provide data for a file.
    #[error("Failed to acquire data for {}: {source}", path.display())]
    Acquisition {
        /// File the acquisition was attempted for.
        path: PathBuf,
        /// What went wrong.
        #[source]
        source: AcquisitionError,
    },

    /// The nominal frame rate is not a finite positive number.
    #[error("Invalid frame rate: {0} (must be finite and greater than zero)")]
    InvalidFrameRate(f64),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl NalscopeError {
    /// Wrap an [`AcquisitionError`] with the path it belongs to.
    pub fn acquisition(path: impl Into<PathBuf>, source: AcquisitionError) -> Self {
        NalscopeError::Acquisition {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if the error came from an external collaborator.
    pub fn is_acquisition(&self) -> bool {
        matches!(self, NalscopeError::Acquisition { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquisition_error_names_the_file() {
        let error = NalscopeError::acquisition(
            "clip.mp4",
            AcquisitionError::ToolFailed {
                tool: "ffprobe",
                status: "exit status: 1".to_string(),
                stderr: "Invalid data found when processing input".to_string(),
            },
        );

        let message = error.to_string();
        assert!(message.contains("clip.mp4"), "{message}");
        assert!(message.contains("ffprobe exited"), "{message}");
        assert!(error.is_acquisition());
    }

    #[test]
    fn invalid_frame_rate_message() {
        let message = NalscopeError::InvalidFrameRate(0.0).to_string();
        assert!(message.contains("Invalid frame rate: 0"));
    }
}
