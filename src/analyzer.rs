//! Per-file analysis pipeline.
//!
//! An [`Analyzer`] combines the two independent observations of a stream:
//!
//! * frame metadata is segmented into GOPs and drives the GOP and bitrate
//!   statistics;
//! * the Annex-B elementary stream is scanned and classified and drives the
//!   reference-frame report.
//!
//! [`Analyzer::analyze`] is the pure core: it takes already-acquired inputs
//! and never fails. [`Analyzer::analyze_file`] and
//! [`Analyzer::analyze_files`] acquire those inputs through a
//! [`MediaSource`] first.
//!
//! # Example
//!
//! ```
//! use nalscope::{AnalysisOptions, Analyzer, frame::frames_from_pattern};
//!
//! let analyzer = Analyzer::new(AnalysisOptions::new().with_frame_rate(60.0))?;
//! let mut frames = frames_from_pattern("IPPPIPPP");
//! for frame in &mut frames {
//!     frame.packet_size = 1000;
//! }
//!
//! let report = analyzer.analyze(&frames, None);
//! assert_eq!(report.gops.count, 2);
//! assert!((report.bitrate.average_bitrate - 480_000.0).abs() < 1e-6);
//! assert!(report.reference.is_none());
//! # Ok::<(), nalscope::NalscopeError>(())
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::AnalysisOptions;
use crate::error::{AcquisitionError, NalscopeError};
use crate::frame::{FrameRecord, PictureType};
use crate::gop::{self, Gop};
use crate::parameters::EncodingParameters;
use crate::progress::{OperationType, ProgressTracker};
use crate::reference::{ReferenceFrameAnalysis, ReferenceFrameReport};
use crate::source::MediaSource;
use crate::statistics::{AnalysisSummary, BitrateStatistics, FrameSizeStatistics, GopStatistics};
use crate::trace::{HeaderTrace, parse_header_trace};

/// Picture types of one of the leading GOPs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GopPreview {
    /// Zero-based GOP position.
    pub index: usize,
    /// Picture types in frame order.
    pub picture_types: Vec<PictureType>,
}

impl GopPreview {
    fn from_gop(index: usize, gop: &Gop<'_>) -> Self {
        Self {
            index,
            picture_types: gop.picture_types(),
        }
    }

    /// Number of frames in the GOP.
    pub fn size(&self) -> usize {
        self.picture_types.len()
    }

    /// Space separated picture types, e.g. `"I P P B"`.
    pub fn pattern(&self) -> String {
        self.picture_types
            .iter()
            .map(|pict_type| pict_type.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Everything computed for one stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// GOP size distribution.
    pub gops: GopStatistics,
    /// The first few GOPs.
    pub gop_previews: Vec<GopPreview>,
    /// Bitrate and frame size statistics.
    pub bitrate: BitrateStatistics,
    /// Reference-frame usage; `None` when no elementary stream was available.
    pub reference: Option<ReferenceFrameReport>,
    /// I/P frame size statistics, only in detailed mode.
    pub frame_sizes: Option<FrameSizeStatistics>,
    /// Numbers for the cross-file comparison.
    pub summary: AnalysisSummary,
}

/// Analysis of one input file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileAnalysis {
    /// File name used in reports and comparison tables.
    pub name: String,
    /// Path the file was read from.
    pub path: PathBuf,
    /// Computed statistics.
    pub report: AnalysisReport,
    /// Encoder settings, when detailed mode was requested and they could be
    /// acquired.
    pub parameters: Option<EncodingParameters>,
    /// Parsed header trace, when header tracing was requested and succeeded.
    pub headers: Option<HeaderTrace>,
}

/// Runs the analysis pipeline with a fixed set of options.
///
/// The analyzer holds no mutable state; analyzing the same inputs twice
/// yields identical reports, and one analyzer may serve several threads.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    options: AnalysisOptions,
}

impl Analyzer {
    /// Create an analyzer.
    ///
    /// # Errors
    ///
    /// Returns [`NalscopeError::InvalidFrameRate`] if the configured frame
    /// rate is not finite and positive.
    pub fn new(options: AnalysisOptions) -> Result<Self, NalscopeError> {
        options.validate()?;
        Ok(Self { options })
    }

    /// The options in use.
    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Analyze already-acquired inputs.
    ///
    /// `frames` are in decoder output order; their packet sizes are the per-frame
    /// sizes for the bitrate statistics. `stream` is the Annex-B elementary
    /// stream, if one could be obtained.
    pub fn analyze(&self, frames: &[FrameRecord], stream: Option<&[u8]>) -> AnalysisReport {
        let frame_rate = self.options.frame_rate;

        let gops = gop::segment(frames);
        let gop_statistics = GopStatistics::compute(&gops, frame_rate);
        let gop_previews = gops
            .iter()
            .take(self.options.gop_preview)
            .enumerate()
            .map(|(index, gop)| GopPreview::from_gop(index, gop))
            .collect();

        let sizes: Vec<u64> = frames.iter().map(|frame| frame.packet_size).collect();
        let bitrate = BitrateStatistics::compute(&sizes, frame_rate, self.options.top_frames);

        let reference = stream.map(|data| {
            ReferenceFrameAnalysis::from_stream(data, self.options.reference_policy).report()
        });
        let reference_ratio = reference
            .as_ref()
            .map_or(0.0, |report| report.reference_ratio);

        let frame_sizes = self
            .options
            .detailed
            .then(|| FrameSizeStatistics::compute(frames));

        let summary = AnalysisSummary::new(&gop_statistics, &bitrate, reference_ratio);

        AnalysisReport {
            gops: gop_statistics,
            gop_previews,
            bitrate,
            reference,
            frame_sizes,
            summary,
        }
    }

    /// Acquire the inputs for `path` from `source` and analyze them.
    ///
    /// Frame metadata is required. A failure to obtain the elementary
    /// stream, the encoding parameters, or the header trace is logged and
    /// leaves the corresponding part of the result empty.
    ///
    /// # Errors
    ///
    /// Returns [`NalscopeError::FileNotFound`] if `path` does not exist and
    /// [`NalscopeError::Acquisition`] if frame metadata cannot be acquired.
    pub fn analyze_file<S>(
        &self,
        source: &S,
        path: impl AsRef<Path>,
    ) -> Result<FileAnalysis, NalscopeError>
    where
        S: MediaSource + ?Sized,
    {
        let path = path.as_ref();
        log::debug!("Analyzing {}", path.display());
        if !path.exists() {
            return Err(NalscopeError::FileNotFound(path.to_path_buf()));
        }

        let frames = source
            .acquire_frame_metadata(path)
            .map_err(|error| NalscopeError::acquisition(path, error))?;

        let stream = optional(
            source.acquire_elementary_stream(path),
            OperationType::ElementaryStream,
            path,
        );
        let report = self.analyze(&frames, stream.as_deref());

        let parameters = if self.options.detailed {
            optional(
                source.acquire_encoding_parameters(path),
                OperationType::EncodingParameters,
                path,
            )
        } else {
            None
        };

        let headers = if self.options.headers {
            optional(
                source.acquire_header_trace(path),
                OperationType::HeaderTrace,
                path,
            )
            .map(|text| parse_header_trace(&text))
        } else {
            None
        };

        Ok(FileAnalysis {
            name: display_name(path),
            path: path.to_path_buf(),
            report,
            parameters,
            headers,
        })
    }

    /// Analyze several files one after another.
    ///
    /// Results are in input order; a failure affects only its own entry.
    /// Once cancellation is requested every remaining entry is
    /// [`NalscopeError::Cancelled`].
    pub fn analyze_files<S, P>(
        &self,
        source: &S,
        paths: &[P],
    ) -> Vec<Result<FileAnalysis, NalscopeError>>
    where
        S: MediaSource + ?Sized,
        P: AsRef<Path>,
    {
        let mut tracker = self.tracker(paths.len());
        let results = paths
            .iter()
            .map(|path| {
                if self.options.is_cancelled() {
                    return Err(NalscopeError::Cancelled);
                }
                let result = self.analyze_file(source, path);
                tracker.advance(Some(path.as_ref().to_path_buf()));
                result
            })
            .collect();
        tracker.finish();
        results
    }

    /// Analyze several files on the rayon thread pool.
    ///
    /// Results are returned in input order, exactly as
    /// [`analyze_files`](Self::analyze_files) would return them.
    #[cfg(feature = "rayon")]
    pub fn analyze_files_parallel<S, P>(
        &self,
        source: &S,
        paths: &[P],
    ) -> Vec<Result<FileAnalysis, NalscopeError>>
    where
        S: MediaSource + ?Sized,
        P: AsRef<Path> + Sync,
    {
        crate::parallel::analyze_files_parallel(self, source, paths)
    }

    /// Analyze files on a blocking worker, yielding results as they finish.
    ///
    /// Results are yielded in input order. Dropping the stream stops the
    /// worker before its next file.
    #[cfg(feature = "async")]
    pub fn analyze_stream<S>(
        &self,
        source: std::sync::Arc<S>,
        paths: Vec<PathBuf>,
    ) -> crate::stream::AnalysisStream
    where
        S: MediaSource + 'static,
    {
        crate::stream::create_analysis_stream(self.clone(), source, paths, None)
    }

    pub(crate) fn tracker(&self, total: usize) -> ProgressTracker {
        ProgressTracker::new(
            self.options.progress.clone(),
            OperationType::Analysis,
            Some(total as u64),
            self.options.batch_size,
        )
    }
}

/// Degrade an optional acquisition to `None`, logging the reason.
fn optional<T>(
    result: Result<T, AcquisitionError>,
    operation: OperationType,
    path: &Path,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(AcquisitionError::Unsupported(what)) => {
            log::debug!("{what} not supported by source; skipping for {}", path.display());
            None
        }
        Err(error) => {
            log::warn!("{operation:?} unavailable for {}: {error}", path.display());
            None
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
