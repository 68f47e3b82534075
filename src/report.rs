//! Plain-text rendering of per-file analysis results.
//!
//! [`FileAnalysis`] implements [`Display`]; the output is a sequence of
//! titled sections:
//!
//! ```text
//! === GOP Structure Analysis ===
//! Total GOPs: 2
//! GOP sizes: min=60, max=60, avg=60.0
//! ...
//! === Bitrate Analysis ===
//! ...
//! === Reference Frame Analysis ===
//! ...
//! ```
//!
//! Bitrates are shown in kbit/s and Mbit/s, sizes in bytes.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::analyzer::{AnalysisReport, FileAnalysis};
use crate::parameters::EncodingParameters;
use crate::reference::ReferenceFrameReport;
use crate::statistics::{BitrateStatistics, FrameSizeStatistics, SizeDistribution};

const MEGA: f64 = 1_000_000.0;
const KILO: f64 = 1_000.0;

impl Display for FileAnalysis {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "Analyzing: {}", self.path.display())?;
        writeln!(f, "{}", "=".repeat(50))?;
        write!(f, "{}", self.report)?;
        if let Some(parameters) = &self.parameters {
            writeln!(f)?;
            write!(f, "{parameters}")?;
        }
        Ok(())
    }
}

impl Display for AnalysisReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write_gops(f, self)?;
        writeln!(f)?;
        write!(f, "{}", self.bitrate)?;
        writeln!(f)?;
        match &self.reference {
            Some(reference) => write!(f, "{reference}")?,
            None => writeln!(f, "Could not extract H.264 stream for NAL analysis")?,
        }
        if let Some(frame_sizes) = &self.frame_sizes {
            writeln!(f)?;
            write!(f, "{frame_sizes}")?;
        }
        Ok(())
    }
}

fn write_gops(f: &mut Formatter<'_>, report: &AnalysisReport) -> FmtResult {
    let gops = &report.gops;
    writeln!(f, "=== GOP Structure Analysis ===")?;
    writeln!(f, "Total GOPs: {}", gops.count)?;
    if gops.count > 0 {
        writeln!(
            f,
            "GOP sizes: min={}, max={}, avg={:.1}",
            gops.min, gops.max, gops.mean
        )?;
        writeln!(
            f,
            "GOP duration: min={:.2}s, max={:.2}s",
            gops.min_seconds, gops.max_seconds
        )?;
    }

    writeln!(f)?;
    writeln!(f, "First {} GOPs:", report.gop_previews.len())?;
    for preview in &report.gop_previews {
        writeln!(
            f,
            "  GOP {}: {} (size: {})",
            preview.index + 1,
            preview.pattern(),
            preview.size()
        )?;
    }
    if gops.count > report.gop_previews.len() {
        writeln!(f, "  ...")?;
    }
    Ok(())
}

impl Display for BitrateStatistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "=== Bitrate Analysis ===")?;
        let Some(sizes) = &self.frame_sizes else {
            return writeln!(f, "No frame data available");
        };

        writeln!(f, "Total frames: {}", self.frame_count)?;
        writeln!(f, "Duration: {:.2}s", self.duration_seconds)?;
        writeln!(
            f,
            "Average bitrate: {:.0} kbps ({:.2} Mbps)",
            self.average_bitrate / KILO,
            self.average_bitrate / MEGA
        )?;
        writeln!(
            f,
            "Frame sizes (bytes): min={}, max={}, avg={:.0}",
            sizes.min, sizes.max, sizes.mean
        )?;
        writeln!(f, "Peak frame bitrate: {:.2} Mbps", self.peak_frame_bitrate / MEGA)?;
        writeln!(f, "Min frame bitrate: {:.2} Mbps", self.min_frame_bitrate / MEGA)?;

        writeln!(f)?;
        writeln!(f, "Largest frames:")?;
        for frame in &self.largest_frames {
            writeln!(
                f,
                "  Frame {}: {} bytes ({:.2} Mbps equivalent)",
                frame.index,
                frame.size,
                frame.bitrate / MEGA
            )?;
        }
        Ok(())
    }
}

impl Display for ReferenceFrameReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "=== Reference Frame Analysis ===")?;
        if !self.has_parameter_sets() {
            writeln!(f, "Warning: Missing SPS/PPS in stream")?;
        }
        if self.total_slices == 0 {
            return writeln!(f, "No slice NAL units found");
        }

        writeln!(f, "Total frames analyzed: {}", self.total_slices)?;
        writeln!(f, "IDR frames (I): {}", self.idr_count)?;
        writeln!(f, "Non-IDR reference frames (P): {}", self.non_idr_reference_count)?;
        writeln!(f, "Non-reference frames (B): {}", self.non_reference_count)?;
        writeln!(f, "Reference frame ratio: {:.1}%", self.reference_ratio)?;

        write_size_line(f, "IDR frame sizes", self.idr_sizes.as_ref())?;
        write_size_line(f, "P frame sizes", self.reference_sizes.as_ref())?;
        Ok(())
    }
}

fn write_size_line(
    f: &mut Formatter<'_>,
    label: &str,
    sizes: Option<&SizeDistribution>,
) -> FmtResult {
    match sizes {
        Some(sizes) => writeln!(
            f,
            "{label}: avg={:.0}, max={}, min={}",
            sizes.mean, sizes.max, sizes.min
        ),
        None => Ok(()),
    }
}

impl Display for FrameSizeStatistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "=== Frame Size Statistics ===")?;
        for (label, sizes) in [("I", &self.i_frames), ("P", &self.p_frames)] {
            match sizes {
                Some(sizes) => writeln!(
                    f,
                    "{label}-frames: count={}, avg={:.0}, std={:.0}",
                    sizes.count, sizes.mean, sizes.std_dev
                )?,
                None => writeln!(f, "{label}-frames: none")?,
            }
        }
        writeln!(f, "Size CV: {:.3}", self.size_cv)
    }
}

impl Display for EncodingParameters {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "=== Encoding Parameters ===")?;
        let rows = [
            ("Profile", &self.profile),
            ("Level", &self.level),
            ("Refs", &self.refs),
            ("B-frames", &self.has_b_frames),
            ("Bit rate", &self.bit_rate),
            ("Max bit rate", &self.max_bit_rate),
            ("Bits per raw sample", &self.bits_per_raw_sample),
            ("Format bit rate", &self.format_bit_rate),
            ("Duration", &self.duration),
        ];
        for (label, value) in rows {
            writeln!(f, "{label}: {}", value.as_deref().unwrap_or("Unknown"))?;
        }
        Ok(())
    }
}
