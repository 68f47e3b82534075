//! Async streaming of batch analysis results.
//!
//! [`AnalysisStream`] runs the analyzer on a `tokio::task::spawn_blocking`
//! thread and streams one result per input file back through a bounded
//! channel. Acquisition spawns external processes and waits on them, so it
//! stays off the runtime's worker threads.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tokio_stream::StreamExt;
//!
//! use nalscope::{Analyzer, FfmpegTools, NalscopeError};
//!
//! # async fn example() -> Result<(), NalscopeError> {
//! let analyzer = Analyzer::default();
//! let mut stream = analyzer.analyze_stream(
//!     Arc::new(FfmpegTools::from_env()),
//!     vec!["a.mp4".into(), "b.mp4".into()],
//! );
//!
//! while let Some(result) = stream.next().await {
//!     let analysis = result?;
//!     println!("{}: {:.0} bit/s", analysis.name, analysis.report.summary.average_bitrate);
//! }
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use tokio_stream::Stream;

use crate::analyzer::{Analyzer, FileAnalysis};
use crate::error::NalscopeError;
use crate::source::MediaSource;

/// Default bounded-channel capacity for [`AnalysisStream`].
const DEFAULT_CHANNEL_CAPACITY: usize = 4;

/// A stream of per-file analysis results produced by a background thread.
///
/// Implements [`tokio_stream::Stream`]. Results arrive in input order.
/// Dropping the stream closes the channel, which stops the background
/// thread before its next file.
pub struct AnalysisStream {
    receiver: Receiver<Result<FileAnalysis, NalscopeError>>,
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

impl Stream for AnalysisStream {
    type Item = Result<FileAnalysis, NalscopeError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Spawn the blocking worker and return the receiving stream.
///
/// `channel_capacity` of `None` uses the default (4).
pub(crate) fn create_analysis_stream<S>(
    analyzer: Analyzer,
    source: Arc<S>,
    paths: Vec<PathBuf>,
    channel_capacity: Option<usize>,
) -> AnalysisStream
where
    S: MediaSource + 'static,
{
    let capacity = channel_capacity.unwrap_or(DEFAULT_CHANNEL_CAPACITY).max(1);
    let (sender, receiver) = tokio::sync::mpsc::channel(capacity);

    let handle = tokio::task::spawn_blocking(move || {
        let mut tracker = analyzer.tracker(paths.len());
        for path in &paths {
            let result = if analyzer.options().is_cancelled() {
                Err(NalscopeError::Cancelled)
            } else {
                analyzer.analyze_file(source.as_ref(), path)
            };
            tracker.advance(Some(path.clone()));

            let cancelled = matches!(result, Err(NalscopeError::Cancelled));
            if sender.blocking_send(result).is_err() || cancelled {
                log::debug!("Analysis stream stopped after {}", path.display());
                break;
            }
        }
        tracker.finish();
    });

    AnalysisStream { receiver, handle }
}
