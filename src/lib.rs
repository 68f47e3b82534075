//! # nalscope
//!
//! Structural analysis of H.264 video for encoder comparison.
//!
//! `nalscope` surfaces the GOP layout, the per-frame size and bitrate
//! distribution, and the reference-frame usage of H.264 streams. At its
//! core is a byte-level Annex-B scanner that finds NAL unit boundaries,
//! classifies each unit, and decides whether it is a keyframe, a reference
//! picture, or a disposable picture. The decode is structural only: no
//! entropy decoding and no pixel reconstruction.
//!
//! ## Quick Start
//!
//! ### Analyze Files
//!
//! ```no_run
//! use nalscope::{AnalysisOptions, Analyzer, ComparisonTable, FfmpegTools};
//!
//! let analyzer = Analyzer::new(AnalysisOptions::new().with_frame_rate(30.0))?;
//! let tools = FfmpegTools::from_env();
//!
//! let mut analyses = Vec::new();
//! for result in analyzer.analyze_files(&tools, &["x264.mp4", "nvenc.mp4"]) {
//!     match result {
//!         Ok(analysis) => {
//!             print!("{analysis}");
//!             analyses.push(analysis);
//!         }
//!         Err(error) => eprintln!("{error}"),
//!     }
//! }
//!
//! if let Some(table) = ComparisonTable::new(&analyses) {
//!     print!("{table}");
//! }
//! # Ok::<(), nalscope::NalscopeError>(())
//! ```
//!
//! ### Scan a Raw Stream
//!
//! ```
//! use nalscope::{classify, nal};
//!
//! let stream = [0, 0, 0, 1, 0x67, 0x42, 0, 0, 1, 0x68, 0xce, 0, 0, 1, 0x65, 0x88];
//! let idr_slices = nal::scan(&stream)
//!     .filter_map(|unit| classify(&unit).as_slice().copied())
//!     .filter(|slice| slice.is_idr)
//!     .count();
//! assert_eq!(idr_slices, 1);
//! ```
//!
//! ## Features
//!
//! - **NAL scanning**: lazy, zero-copy iteration over 3- and 4-byte start
//!   codes at any alignment
//! - **Classification**: parameter sets, IDR and non-IDR slices, reference
//!   and non-reference pictures
//! - **GOP segmentation**: keyframe-delimited groups, including a leading
//!   open GOP
//! - **Statistics**: GOP size distribution, average/peak/min bitrate,
//!   largest frames, reference ratio, I/P size spread
//! - **Header traces**: SPS/PPS/slice header field comparison between files
//! - **Pluggable acquisition**: the [`MediaSource`] trait; the default
//!   [`FfmpegTools`] runs `ffprobe` and `ffmpeg`
//! - **Progress & cancellation**: cooperative callbacks and
//!   [`CancellationToken`] for batch analysis
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | `AnalysisStream` for async batch analysis via Tokio |
//! | `rayon` | `analyze_files_parallel()` distributes files across rayon threads |
//! | `libav` | `LibavSource`, in-process demuxing and decoding via `ffmpeg-next` |
//! | `full` | Enables all of the above |

pub mod analyzer;
pub mod avcc;
pub mod classify;
pub mod comparison;
pub mod config;
pub mod error;
pub mod frame;
pub mod gop;
#[cfg(feature = "libav")]
pub mod libav;
pub mod nal;
#[cfg(feature = "rayon")]
mod parallel;
pub mod parameters;
pub mod progress;
pub mod reference;
mod report;
pub mod source;
pub mod statistics;
#[cfg(feature = "async")]
pub mod stream;
pub mod tools;
pub mod trace;

pub use analyzer::{AnalysisReport, Analyzer, FileAnalysis, GopPreview};
pub use classify::{
    NalRole, ParameterSetKind, ReferencePolicy, SliceClassification, SliceType, classify,
    classify_with_policy,
};
pub use comparison::{ComparisonTable, DetailedComparison, HeaderComparison};
pub use config::{AnalysisOptions, ToolPaths};
pub use error::{AcquisitionError, NalscopeError};
pub use frame::{FrameRecord, PictureType};
pub use gop::{Gop, GopIterator};
#[cfg(feature = "libav")]
pub use libav::LibavSource;
pub use nal::{NalIterator, NalUnit, NalUnitType};
pub use parameters::EncodingParameters;
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use reference::{ReferenceFrameAnalysis, ReferenceFrameReport};
pub use source::MediaSource;
pub use statistics::{
    AnalysisSummary, BitrateStatistics, FrameSizeStatistics, GopStatistics, LargeFrame,
    SizeDistribution,
};
#[cfg(feature = "async")]
pub use stream::AnalysisStream;
pub use tools::FfmpegTools;
pub use trace::{HeaderFields, HeaderTrace, parse_header_trace};
