//! Analysis configuration.
//!
//! [`AnalysisOptions`] is a builder that threads the nominal frame rate,
//! report sizes, progress callbacks, and cancellation tokens through the
//! [`Analyzer`](crate::Analyzer) without polluting every function signature.
//! [`ToolPaths`] locates the external executables used by
//! [`FfmpegTools`](crate::FfmpegTools).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use nalscope::{AnalysisOptions, CancellationToken, ProgressCallback, ProgressInfo};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{:?}: {} done", info.operation, info.current);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = AnalysisOptions::new()
//!     .with_frame_rate(30.0)
//!     .with_detailed(true)
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone());
//! assert_eq!(options.frame_rate(), 30.0);
//! ```

use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::sync::Arc;

use crate::classify::ReferencePolicy;
use crate::error::NalscopeError;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Nominal frame rate used when none is given.
pub const DEFAULT_FRAME_RATE: f64 = 60.0;
/// Length of the largest-frames ranking.
pub const DEFAULT_TOP_FRAMES: usize = 5;
/// Number of GOPs shown in the GOP preview.
pub const DEFAULT_GOP_PREVIEW: usize = 5;

/// Environment variable overriding the `ffprobe` executable.
pub const FFPROBE_ENV: &str = "NALSCOPE_FFPROBE";
/// Environment variable overriding the `ffmpeg` executable.
pub const FFMPEG_ENV: &str = "NALSCOPE_FFMPEG";

/// Configuration for analysis operations.
///
/// All fields have defaults; a default-constructed value analyzes at 60
/// frames per second with the simplified reference rule and no detailed
/// statistics.
#[derive(Clone)]
pub struct AnalysisOptions {
    pub(crate) frame_rate: f64,
    pub(crate) top_frames: usize,
    pub(crate) gop_preview: usize,
    pub(crate) detailed: bool,
    pub(crate) headers: bool,
    pub(crate) reference_policy: ReferencePolicy,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N files).
    pub(crate) batch_size: u64,
}

impl Debug for AnalysisOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AnalysisOptions")
            .field("frame_rate", &self.frame_rate)
            .field("top_frames", &self.top_frames)
            .field("gop_preview", &self.gop_preview)
            .field("detailed", &self.detailed)
            .field("headers", &self.headers)
            .field("reference_policy", &self.reference_policy)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            top_frames: DEFAULT_TOP_FRAMES,
            gop_preview: DEFAULT_GOP_PREVIEW,
            detailed: false,
            headers: false,
            reference_policy: ReferencePolicy::NalType,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
        }
    }

    /// Set the nominal frame rate in frames per second.
    ///
    /// The value is checked by [`validate`](Self::validate) before analysis.
    #[must_use]
    pub fn with_frame_rate(mut self, frame_rate: f64) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Set how many of the largest frames are ranked.
    #[must_use]
    pub fn with_top_frames(mut self, count: usize) -> Self {
        self.top_frames = count;
        self
    }

    /// Set how many leading GOPs are previewed.
    #[must_use]
    pub fn with_gop_preview(mut self, count: usize) -> Self {
        self.gop_preview = count;
        self
    }

    /// Enable I/P frame-size statistics and encoding parameters.
    #[must_use]
    pub fn with_detailed(mut self, detailed: bool) -> Self {
        self.detailed = detailed;
        self
    }

    /// Collect header traces for the header comparison.
    #[must_use]
    pub fn with_headers(mut self, headers: bool) -> Self {
        self.headers = headers;
        self
    }

    /// Choose how slice referenceability is decided.
    #[must_use]
    pub fn with_reference_policy(mut self, policy: ReferencePolicy) -> Self {
        self.reference_policy = policy;
        self
    }

    /// Attach a progress callback, invoked after every
    /// [`batch_size`](AnalysisOptions::with_batch_size) analyzed files.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token, checked before each file.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// The nominal frame rate.
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Whether detailed statistics are requested.
    pub fn detailed(&self) -> bool {
        self.detailed
    }

    /// Whether header traces are requested.
    pub fn headers(&self) -> bool {
        self.headers
    }

    /// The reference classification rule.
    pub fn reference_policy(&self) -> ReferencePolicy {
        self.reference_policy
    }

    /// Check that the options can be used for analysis.
    ///
    /// # Errors
    ///
    /// Returns [`NalscopeError::InvalidFrameRate`] unless the frame rate is
    /// finite and positive.
    pub fn validate(&self) -> Result<(), NalscopeError> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(NalscopeError::InvalidFrameRate(self.frame_rate));
        }
        Ok(())
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}

/// Locations of the external executables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    /// The stream inspection tool.
    pub ffprobe: PathBuf,
    /// The transcoding tool.
    pub ffmpeg: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffprobe: PathBuf::from("ffprobe"),
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

impl ToolPaths {
    /// Defaults resolved through `PATH`, overridden by the
    /// [`FFPROBE_ENV`] and [`FFMPEG_ENV`] environment variables when set.
    pub fn from_env() -> Self {
        let mut paths = Self::default();
        if let Some(ffprobe) = env::var_os(FFPROBE_ENV).filter(|value| !value.is_empty()) {
            paths.ffprobe = PathBuf::from(ffprobe);
        }
        if let Some(ffmpeg) = env::var_os(FFMPEG_ENV).filter(|value| !value.is_empty()) {
            paths.ffmpeg = PathBuf::from(ffmpeg);
        }
        paths
    }

    /// Replace the `ffprobe` path.
    #[must_use]
    pub fn with_ffprobe(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffprobe = path.into();
        self
    }

    /// Replace the `ffmpeg` path.
    #[must_use]
    pub fn with_ffmpeg(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg = path.into();
        self
    }
}
