//! End-to-end analysis through a synthetic [`MediaSource`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use nalscope::frame::frames_from_pattern;
use nalscope::{
    AcquisitionError, AnalysisOptions, Analyzer, CancellationToken, ComparisonTable,
    DetailedComparison, EncodingParameters, FrameRecord, HeaderComparison, MediaSource,
    NalscopeError, ProgressCallback, ProgressInfo,
};
use tempfile::TempDir;

const TRACE_A: &str = "\
[trace_headers @ 0x1] Sequence Parameter Set
[trace_headers @ 0x1] 0           profile_idc                            01100100 = 100
[trace_headers @ 0x1] 24          level_idc                              00101000 = 40
[trace_headers @ 0x1] Picture Parameter Set
[trace_headers @ 0x1] 0           entropy_coding_mode_flag                      1 = 1
[trace_headers @ 0x1] Slice Header
[trace_headers @ 0x1] 0           first_mb_in_slice                             1 = 0
";

const TRACE_B: &str = "\
[trace_headers @ 0x2] Sequence Parameter Set
[trace_headers @ 0x2] 0           profile_idc                            01100100 = 100
[trace_headers @ 0x2] 24          level_idc                              00101001 = 41
[trace_headers @ 0x2] Picture Parameter Set
[trace_headers @ 0x2] 0           entropy_coding_mode_flag                      1 = 1
[trace_headers @ 0x2] Slice Header
[trace_headers @ 0x2] 0           first_mb_in_slice                             1 = 0
";

/// Serves canned inputs keyed by file name.
#[derive(Default)]
struct FakeSource {
    broken_stream: bool,
    broken_metadata: bool,
}

fn sized_frames(pattern: &str, size: u64) -> Vec<FrameRecord> {
    let mut frames = frames_from_pattern(pattern);
    for frame in &mut frames {
        frame.packet_size = if frame.is_keyframe() { size * 4 } else { size };
    }
    frames
}

fn stream() -> Vec<u8> {
    let units: [&[u8]; 5] = [
        &[0x67, 0x64, 0x00, 0x28],
        &[0x68, 0xee],
        &[0x65, 0x88, 0x84, 0x00, 0x10],
        &[0x41, 0x9a, 0x02],
        &[0x01, 0x9e, 0x04],
    ];
    let mut data = Vec::new();
    for unit in units {
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x01]);
        data.extend_from_slice(unit);
    }
    data
}

impl MediaSource for FakeSource {
    fn acquire_frame_metadata(&self, path: &Path) -> Result<Vec<FrameRecord>, AcquisitionError> {
        if self.broken_metadata {
            return Err(AcquisitionError::MalformedOutput {
                tool: "fake",
                reason: "no frames".to_string(),
            });
        }
        let pattern = if path.ends_with("a.mp4") {
            "IPPPIPPP"
        } else {
            "IPPPPPIPPPPP"
        };
        Ok(sized_frames(pattern, 1000))
    }

    fn acquire_elementary_stream(&self, _path: &Path) -> Result<Vec<u8>, AcquisitionError> {
        if self.broken_stream {
            return Err(AcquisitionError::ToolFailed {
                tool: "fake",
                status: "exit status: 1".to_string(),
                stderr: "boom".to_string(),
            });
        }
        Ok(stream())
    }

    fn acquire_header_trace(&self, path: &Path) -> Result<String, AcquisitionError> {
        Ok(if path.ends_with("a.mp4") { TRACE_A } else { TRACE_B }.to_string())
    }

    fn acquire_encoding_parameters(
        &self,
        _path: &Path,
    ) -> Result<EncodingParameters, AcquisitionError> {
        Ok(EncodingParameters {
            profile: Some("High".to_string()),
            level: Some("40".to_string()),
            bit_rate: Some("2500000".to_string()),
            ..Default::default()
        })
    }
}

fn fixtures() -> (TempDir, Vec<PathBuf>) {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<PathBuf> = ["a.mp4", "b.mp4"]
        .iter()
        .map(|name| dir.path().join(name))
        .collect();
    for path in &paths {
        fs::write(path, b"not really a video").unwrap();
    }
    (dir, paths)
}

#[test]
fn analyze_file_combines_all_parts() {
    let (_dir, paths) = fixtures();
    let analyzer = Analyzer::new(AnalysisOptions::new().with_frame_rate(8.0)).unwrap();
    let analysis = analyzer.analyze_file(&FakeSource::default(), &paths[0]).unwrap();

    assert_eq!(analysis.name, "a.mp4");
    let report = &analysis.report;
    assert_eq!(report.gops.sizes, [4, 4]);
    assert_eq!(report.summary.i_frame_count, 2);
    assert_eq!(report.summary.average_gop_size, 4.0);

    // 2 * 4000 + 6 * 1000 bytes over one second.
    assert!((report.bitrate.average_bitrate - 112_000.0).abs() < 1e-6);

    let reference = report.reference.as_ref().unwrap();
    assert!(reference.has_parameter_sets());
    assert_eq!(reference.total_slices, 3);
    assert_eq!(reference.reference_ratio, 100.0);
    assert_eq!(report.summary.reference_ratio, 100.0);

    assert!(analysis.parameters.is_none());
    assert!(analysis.headers.is_none());
}

#[test]
fn analysis_is_idempotent() {
    let (_dir, paths) = fixtures();
    let analyzer = Analyzer::default();
    let source = FakeSource::default();
    let first = analyzer.analyze_file(&source, &paths[1]).unwrap();
    let second = analyzer.analyze_file(&source, &paths[1]).unwrap();
    assert_eq!(first.report, second.report);
}

#[test]
fn missing_file_is_reported_per_entry() {
    let (dir, mut paths) = fixtures();
    paths.insert(1, dir.path().join("missing.mp4"));

    let results = Analyzer::default().analyze_files(&FakeSource::default(), &paths);
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(NalscopeError::FileNotFound(_))));
    assert!(results[2].is_ok());
}

#[test]
fn metadata_failure_fails_the_file() {
    let (_dir, paths) = fixtures();
    let source = FakeSource {
        broken_metadata: true,
        ..Default::default()
    };
    let error = Analyzer::default()
        .analyze_file(&source, &paths[0])
        .unwrap_err();
    assert!(error.is_acquisition());
}

#[test]
fn stream_failure_only_drops_reference_analysis() {
    let (_dir, paths) = fixtures();
    let source = FakeSource {
        broken_stream: true,
        ..Default::default()
    };
    let analysis = Analyzer::default().analyze_file(&source, &paths[0]).unwrap();
    assert!(analysis.report.reference.is_none());
    assert_eq!(analysis.report.summary.reference_ratio, 0.0);
    assert_eq!(analysis.report.gops.count, 2);

    let text = analysis.to_string();
    assert!(text.contains("Could not extract H.264 stream for NAL analysis"));
}

#[test]
fn cancelled_batch_yields_cancelled_entries() {
    let (_dir, paths) = fixtures();
    let token = CancellationToken::new();
    token.cancel();
    let analyzer = Analyzer::new(AnalysisOptions::new().with_cancellation(token)).unwrap();

    let results = analyzer.analyze_files(&FakeSource::default(), &paths);
    assert!(
        results
            .iter()
            .all(|result| matches!(result, Err(NalscopeError::Cancelled)))
    );
}

#[derive(Default)]
struct Recorder(Mutex<Vec<(u64, Option<u64>)>>);

impl ProgressCallback for Recorder {
    fn on_progress(&self, info: &ProgressInfo) {
        self.0.lock().unwrap().push((info.current, info.total));
    }
}

#[test]
fn batch_reports_progress() {
    let (_dir, paths) = fixtures();
    let recorder = Arc::new(Recorder::default());
    let analyzer = Analyzer::new(AnalysisOptions::new().with_progress(recorder.clone())).unwrap();

    analyzer.analyze_files(&FakeSource::default(), &paths);
    let reports = recorder.0.lock().unwrap();
    assert_eq!(reports.first(), Some(&(1, Some(2))));
    assert_eq!(reports.last(), Some(&(2, Some(2))));
}

#[test]
fn comparison_tables_need_two_files() {
    let (_dir, paths) = fixtures();
    let analyzer = Analyzer::new(
        AnalysisOptions::new()
            .with_detailed(true)
            .with_headers(true),
    )
    .unwrap();
    let analyses: Vec<_> = analyzer
        .analyze_files(&FakeSource::default(), &paths)
        .into_iter()
        .map(Result::unwrap)
        .collect();

    assert!(ComparisonTable::new(&analyses[..1]).is_none());
    let table = ComparisonTable::new(&analyses).unwrap();
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[1].summary.average_gop_size, 6.0);
    assert!(table.to_string().contains("=== Basic Comparison Summary ==="));

    let detailed = DetailedComparison::new(&analyses).unwrap();
    assert_eq!(detailed.rows[0].bit_rate.as_deref(), Some("2500k"));
    assert!(detailed.rows[0].frame_sizes.is_some());

    let headers = HeaderComparison::new(&analyses).unwrap();
    assert_eq!(headers.files, ["a.mp4".to_string(), "b.mp4".to_string()]);
    assert_eq!(headers.difference_count(), 1);
    let text = headers.to_string();
    assert!(text.contains("level_idc"));
    assert!(text.contains("*** DIFF ***"));
}

#[test]
fn reports_serialize_to_json() {
    let (_dir, paths) = fixtures();
    let analysis = Analyzer::default()
        .analyze_file(&FakeSource::default(), &paths[0])
        .unwrap();
    let value = serde_json::to_value(&analysis).unwrap();
    assert_eq!(value["name"], "a.mp4");
    assert_eq!(value["report"]["gops"]["count"], 2);
    assert_eq!(value["report"]["gop_previews"][0]["picture_types"][0], "I");
}

#[cfg(feature = "rayon")]
#[test]
fn parallel_results_match_sequential() {
    let (_dir, paths) = fixtures();
    let analyzer = Analyzer::default();
    let source = FakeSource::default();
    let sequential = analyzer.analyze_files(&source, &paths);
    let parallel = analyzer.analyze_files_parallel(&source, &paths);

    for (left, right) in sequential.iter().zip(&parallel) {
        assert_eq!(left.as_ref().unwrap().report, right.as_ref().unwrap().report);
    }
}

#[cfg(feature = "async")]
#[tokio::test]
async fn stream_yields_results_in_order() {
    use tokio_stream::StreamExt;

    let (_dir, paths) = fixtures();
    let mut stream = Analyzer::default().analyze_stream(Arc::new(FakeSource::default()), paths);

    let mut names = Vec::new();
    while let Some(result) = stream.next().await {
        names.push(result.unwrap().name);
    }
    assert_eq!(names, ["a.mp4", "b.mp4"]);
}
