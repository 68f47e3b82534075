//! Parallel batch analysis.
//!
//! Files are distributed across the rayon thread pool. Analyses of
//! different files share no mutable state; each worker acquires and owns
//! its own buffers. The public API is
//! [`Analyzer::analyze_files_parallel`](crate::Analyzer::analyze_files_parallel).

use std::path::Path;
use std::sync::Mutex;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::analyzer::{Analyzer, FileAnalysis};
use crate::error::NalscopeError;
use crate::source::MediaSource;

/// Analyze `paths` in parallel, returning results in input order.
pub(crate) fn analyze_files_parallel<S, P>(
    analyzer: &Analyzer,
    source: &S,
    paths: &[P],
) -> Vec<Result<FileAnalysis, NalscopeError>>
where
    S: MediaSource + ?Sized,
    P: AsRef<Path> + Sync,
{
    log::debug!("Analyzing {} files in parallel", paths.len());
    let tracker = Mutex::new(analyzer.tracker(paths.len()));

    let results: Vec<Result<FileAnalysis, NalscopeError>> = paths
        .par_iter()
        .map(|path| {
            if analyzer.options().is_cancelled() {
                return Err(NalscopeError::Cancelled);
            }
            let result = analyzer.analyze_file(source, path);
            if let Ok(mut tracker) = tracker.lock() {
                tracker.advance(Some(path.as_ref().to_path_buf()));
            }
            result
        })
        .collect();

    if let Ok(mut tracker) = tracker.into_inner() {
        tracker.finish();
    }
    results
}
