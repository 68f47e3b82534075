//! Cross-file comparison tables.
//!
//! The tables only re-present per-file results; nothing is recomputed.
//! Every constructor returns `None` unless at least two files are
//! available, since a single file has nothing to be compared with.
//!
//! # Example
//!
//! ```no_run
//! use nalscope::{Analyzer, ComparisonTable, FfmpegTools};
//!
//! let analyzer = Analyzer::default();
//! let analyses: Vec<_> = analyzer
//!     .analyze_files(&FfmpegTools::from_env(), &["x264.mp4", "nvenc.mp4"])
//!     .into_iter()
//!     .filter_map(Result::ok)
//!     .collect();
//!
//! if let Some(table) = ComparisonTable::new(&analyses) {
//!     print!("{table}");
//! }
//! ```

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;

use crate::analyzer::FileAnalysis;
use crate::statistics::{AnalysisSummary, FrameSizeStatistics};
use crate::trace::HeaderFields;

/// Marker appended to header rows whose values differ.
pub const DIFF_MARKER: &str = "*** DIFF ***";
/// Placeholder for a value one of the files does not have.
pub const MISSING_VALUE: &str = "N/A";

const MEGA: f64 = 1_000_000.0;

/// One row of the basic comparison table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    /// File name.
    pub name: String,
    /// Per-file summary.
    pub summary: AnalysisSummary,
}

/// Basic summary table: bitrate, GOP size, peak frame, I-frames, reference
/// ratio for each file in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonTable {
    /// Rows in input order.
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    /// Build the table, or `None` with fewer than two files.
    pub fn new(analyses: &[FileAnalysis]) -> Option<Self> {
        if analyses.len() < 2 {
            return None;
        }
        let rows = analyses
            .iter()
            .map(|analysis| ComparisonRow {
                name: analysis.name.clone(),
                summary: analysis.report.summary,
            })
            .collect();
        Some(Self { rows })
    }
}

impl Display for ComparisonTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "=== Basic Comparison Summary ===")?;
        writeln!(
            f,
            "{:<20} {:<12} {:<10} {:<12} {:<10} {:<10}",
            "File", "Avg Bitrate", "GOP Size", "Peak Frame", "I-Frames", "Ref Ratio"
        )?;
        writeln!(f, "{}", "-".repeat(80))?;
        for row in &self.rows {
            let summary = &row.summary;
            writeln!(
                f,
                "{:<20} {:<12.2} {:<10.1} {:<12.2} {:<10} {:<10.1}",
                row.name,
                summary.average_bitrate / MEGA,
                summary.average_gop_size,
                summary.peak_frame_bitrate / MEGA,
                summary.i_frame_count,
                summary.reference_ratio
            )?;
        }
        Ok(())
    }
}

/// One row of the detailed comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedRow {
    /// File name.
    pub name: String,
    /// Codec profile.
    pub profile: Option<String>,
    /// Codec level.
    pub level: Option<String>,
    /// Reference frame count.
    pub refs: Option<String>,
    /// B-frame reorder depth.
    pub has_b_frames: Option<String>,
    /// Stream bit rate in kbit/s, e.g. `"4500k"`, or the raw reported value.
    pub bit_rate: Option<String>,
    /// I/P frame size statistics.
    pub frame_sizes: Option<FrameSizeStatistics>,
}

/// Encoder settings and frame size statistics side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedComparison {
    /// Rows in input order.
    pub rows: Vec<DetailedRow>,
}

impl DetailedComparison {
    /// Build the table, or `None` with fewer than two files.
    pub fn new(analyses: &[FileAnalysis]) -> Option<Self> {
        if analyses.len() < 2 {
            return None;
        }
        let rows = analyses
            .iter()
            .map(|analysis| {
                let parameters = analysis.parameters.clone().unwrap_or_default();
                let bit_rate = parameters.bit_rate_kbps().or(parameters.bit_rate);
                DetailedRow {
                    name: analysis.name.clone(),
                    profile: parameters.profile,
                    level: parameters.level,
                    refs: parameters.refs,
                    has_b_frames: parameters.has_b_frames,
                    bit_rate,
                    frame_sizes: analysis.report.frame_sizes.clone(),
                }
            })
            .collect();
        Some(Self { rows })
    }
}

impl Display for DetailedComparison {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "=== Detailed Encoder Comparison ===")?;
        writeln!(
            f,
            "{:<25} {:<8} {:<6} {:<5} {:<8} {:<10}",
            "File", "Profile", "Level", "Refs", "B-frames", "Bit Rate"
        )?;
        writeln!(f, "{}", "-".repeat(70))?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<25} {:<8} {:<6} {:<5} {:<8} {:<10}",
                row.name,
                or_missing(&row.profile),
                or_missing(&row.level),
                or_missing(&row.refs),
                or_missing(&row.has_b_frames),
                or_missing(&row.bit_rate)
            )?;
        }

        writeln!(f)?;
        writeln!(f, "=== Frame Size Statistics ===")?;
        writeln!(
            f,
            "{:<25} {:<12} {:<12} {:<12} {:<12} {:<8}",
            "File", "I-Frame Avg", "I-Frame Std", "P-Frame Avg", "P-Frame Std", "Size CV"
        )?;
        writeln!(f, "{}", "-".repeat(95))?;
        for row in &self.rows {
            let stats = row.frame_sizes.as_ref();
            let i_frames = stats.and_then(|stats| stats.i_frames.as_ref());
            let p_frames = stats.and_then(|stats| stats.p_frames.as_ref());
            writeln!(
                f,
                "{:<25} {:<12.0} {:<12.0} {:<12.0} {:<12.0} {:<8.3}",
                row.name,
                i_frames.map_or(0.0, |sizes| sizes.mean),
                i_frames.map_or(0.0, |sizes| sizes.std_dev),
                p_frames.map_or(0.0, |sizes| sizes.mean),
                p_frames.map_or(0.0, |sizes| sizes.std_dev),
                stats.map_or(0.0, |stats| stats.size_cv)
            )?;
        }
        Ok(())
    }
}

/// One header field as seen in both files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderRow {
    /// Syntax element name.
    pub name: String,
    /// Value in the first file.
    pub first: Option<String>,
    /// Value in the second file.
    pub second: Option<String>,
}

impl HeaderRow {
    /// The two files disagree, including when only one has the field.
    pub fn differs(&self) -> bool {
        self.first != self.second
    }
}

/// A titled group of header rows, sorted by field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderSection {
    /// Section title.
    pub title: &'static str,
    /// Rows sorted by name.
    pub rows: Vec<HeaderRow>,
}

impl HeaderSection {
    fn new(title: &'static str, first: &HeaderFields, second: &HeaderFields) -> Self {
        let names: BTreeSet<&String> = first.keys().chain(second.keys()).collect();
        let rows = names
            .into_iter()
            .map(|name| HeaderRow {
                name: name.clone(),
                first: first.get(name).cloned(),
                second: second.get(name).cloned(),
            })
            .collect();
        Self { title, rows }
    }

    /// Rows whose values differ.
    pub fn differences(&self) -> impl Iterator<Item = &HeaderRow> {
        self.rows.iter().filter(|row| row.differs())
    }
}

/// SPS, PPS, and first slice header of two files side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderComparison {
    /// Names of the two compared files.
    pub files: [String; 2],
    /// SPS, PPS, and first slice header sections.
    pub sections: Vec<HeaderSection>,
}

impl HeaderComparison {
    /// Compare the first two files that carry a header trace.
    ///
    /// Returns `None` if fewer than two traces are available.
    pub fn new(analyses: &[FileAnalysis]) -> Option<Self> {
        let mut traced = analyses
            .iter()
            .filter_map(|analysis| analysis.headers.as_ref().map(|trace| (analysis, trace)));
        let (first_file, first) = traced.next()?;
        let (second_file, second) = traced.next()?;

        let empty = HeaderFields::new();
        let sections = vec![
            HeaderSection::new("SPS PARAMETERS", &first.sps, &second.sps),
            HeaderSection::new("PPS PARAMETERS", &first.pps, &second.pps),
            HeaderSection::new(
                "FIRST SLICE HEADER",
                first.first_slice().unwrap_or(&empty),
                second.first_slice().unwrap_or(&empty),
            ),
        ];

        Some(Self {
            files: [first_file.name.clone(), second_file.name.clone()],
            sections,
        })
    }

    /// Total number of differing fields across all sections.
    pub fn difference_count(&self) -> usize {
        self.sections
            .iter()
            .map(|section| section.differences().count())
            .sum()
    }
}

impl Display for HeaderComparison {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "{}", "=".repeat(80))?;
        writeln!(f, "H.264 HEADER COMPARISON")?;
        writeln!(f, "{}", "=".repeat(80))?;

        for section in &self.sections {
            writeln!(f)?;
            writeln!(
                f,
                "{:<50} {:<15} {:<15}",
                section.title, self.files[0], self.files[1]
            )?;
            writeln!(f, "{}", "-".repeat(80))?;
            for row in &section.rows {
                let marker = if row.differs() {
                    format!(" {DIFF_MARKER}")
                } else {
                    String::new()
                };
                writeln!(
                    f,
                    "{:<50} {:<15} {:<15}{marker}",
                    row.name,
                    or_missing(&row.first),
                    or_missing(&row.second)
                )?;
            }
        }
        Ok(())
    }
}

fn or_missing(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(MISSING_VALUE)
}
