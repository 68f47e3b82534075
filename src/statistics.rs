//! Numeric aggregation over GOPs, frame sizes, and slice classifications.
//!
//! Everything here is a pure computation: no I/O, no shared state. Empty
//! inputs produce zero-valued (or `None`) statistics rather than errors.
//!
//! The frame rate passed to these functions is a nominal measurement
//! parameter supplied by the caller. Stream timestamps are not consulted.
//!
//! Standard deviations use the population formula
//! `sqrt(mean((x - mean)^2))`, not the Bessel-corrected sample formula.

use serde::Serialize;

use crate::classify::SliceClassification;
use crate::frame::{FrameRecord, PictureType};
use crate::gop::Gop;

/// Bits per byte.
const BITS_PER_BYTE: u64 = 8;

/// Instantaneous bitrate equivalent of a single frame: `size * 8 * frame_rate`.
pub fn frame_bitrate(size: u64, frame_rate: f64) -> f64 {
    (size * BITS_PER_BYTE) as f64 * frame_rate
}

/// Arithmetic mean, `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation, `0.0` for an empty slice.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean(values);
    let variance =
        values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Summary of a set of byte sizes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeDistribution {
    /// Number of samples.
    pub count: usize,
    /// Arithmetic mean in bytes.
    pub mean: f64,
    /// Population standard deviation in bytes.
    pub std_dev: f64,
    /// Smallest sample.
    pub min: u64,
    /// Largest sample.
    pub max: u64,
}

impl SizeDistribution {
    /// Summarise `sizes`; `None` when there are none.
    pub fn from_sizes(sizes: &[u64]) -> Option<Self> {
        let min = sizes.iter().copied().min()?;
        let max = sizes.iter().copied().max()?;
        let values: Vec<f64> = sizes.iter().map(|&size| size as f64).collect();

        Some(Self {
            count: sizes.len(),
            mean: mean(&values),
            std_dev: population_std_dev(&values),
            min,
            max,
        })
    }

    /// `std_dev / mean`, or `0.0` when the mean is zero.
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean > 0.0 {
            self.std_dev / self.mean
        } else {
            0.0
        }
    }
}

/// GOP size distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GopStatistics {
    /// Number of GOPs.
    pub count: usize,
    /// Frames per GOP, in GOP order.
    pub sizes: Vec<usize>,
    /// Smallest GOP in frames (0 when there are no GOPs).
    pub min: usize,
    /// Largest GOP in frames (0 when there are no GOPs).
    pub max: usize,
    /// Mean GOP size in frames.
    pub mean: f64,
    /// `min` expressed in seconds at the nominal frame rate.
    pub min_seconds: f64,
    /// `max` expressed in seconds at the nominal frame rate.
    pub max_seconds: f64,
    /// `mean` expressed in seconds at the nominal frame rate.
    pub mean_seconds: f64,
    /// Number of frames whose picture type is I.
    pub keyframe_count: usize,
}

impl GopStatistics {
    /// Compute the distribution of `gops` at `frame_rate` frames per second.
    pub fn compute(gops: &[Gop<'_>], frame_rate: f64) -> Self {
        let sizes: Vec<usize> = gops.iter().map(Gop::len).collect();
        let min = sizes.iter().copied().min().unwrap_or(0);
        let max = sizes.iter().copied().max().unwrap_or(0);
        let mean = if sizes.is_empty() {
            0.0
        } else {
            sizes.iter().sum::<usize>() as f64 / sizes.len() as f64
        };
        let to_seconds = |frames: f64| {
            if frame_rate > 0.0 {
                frames / frame_rate
            } else {
                0.0
            }
        };

        Self {
            count: sizes.len(),
            min,
            max,
            mean,
            min_seconds: to_seconds(min as f64),
            max_seconds: to_seconds(max as f64),
            mean_seconds: to_seconds(mean),
            keyframe_count: gops.iter().map(Gop::keyframe_count).sum(),
            sizes,
        }
    }
}

/// One entry of the largest-frames ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LargeFrame {
    /// Position of the frame in the size sequence.
    pub index: usize,
    /// Frame size in bytes.
    pub size: u64,
    /// Instantaneous bitrate equivalent in bits per second.
    pub bitrate: f64,
}

/// Bitrate and frame-size statistics of a stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BitrateStatistics {
    /// Number of frames.
    pub frame_count: usize,
    /// `sum(size * 8)`.
    pub total_bits: u64,
    /// `frame_count / frame_rate` in seconds.
    pub duration_seconds: f64,
    /// `total_bits / duration`, or `0.0` for a zero duration.
    pub average_bitrate: f64,
    /// Distribution of frame sizes in bytes, `None` for an empty stream.
    pub frame_sizes: Option<SizeDistribution>,
    /// Bitrate equivalent of the largest frame.
    pub peak_frame_bitrate: f64,
    /// Bitrate equivalent of the smallest frame.
    pub min_frame_bitrate: f64,
    /// The largest frames, biggest first; ties keep input order.
    pub largest_frames: Vec<LargeFrame>,
}

impl BitrateStatistics {
    /// Compute bitrate statistics of `sizes` (bytes per frame).
    ///
    /// `top_n` bounds the length of [`largest_frames`](Self::largest_frames).
    pub fn compute(sizes: &[u64], frame_rate: f64, top_n: usize) -> Self {
        let frame_count = sizes.len();
        let total_bits: u64 = sizes.iter().map(|size| size * BITS_PER_BYTE).sum();
        let duration_seconds = if frame_rate > 0.0 {
            frame_count as f64 / frame_rate
        } else {
            0.0
        };
        let average_bitrate = if duration_seconds > 0.0 {
            total_bits as f64 / duration_seconds
        } else {
            0.0
        };

        let frame_sizes = SizeDistribution::from_sizes(sizes);
        let (peak_frame_bitrate, min_frame_bitrate) = frame_sizes
            .as_ref()
            .map(|distribution| {
                (
                    frame_bitrate(distribution.max, frame_rate),
                    frame_bitrate(distribution.min, frame_rate),
                )
            })
            .unwrap_or((0.0, 0.0));

        let mut ranked: Vec<(usize, u64)> = sizes.iter().copied().enumerate().collect();
        // Stable sort: equal sizes stay in index order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        let largest_frames = ranked
            .into_iter()
            .take(top_n)
            .map(|(index, size)| LargeFrame {
                index,
                size,
                bitrate: frame_bitrate(size, frame_rate),
            })
            .collect();

        Self {
            frame_count,
            total_bits,
            duration_seconds,
            average_bitrate,
            frame_sizes,
            peak_frame_bitrate,
            min_frame_bitrate,
            largest_frames,
        }
    }
}

/// Percentage of `slices` classified as reference pictures.
///
/// Returns `0.0` when there are no slices.
pub fn reference_ratio(slices: &[SliceClassification]) -> f64 {
    if slices.is_empty() {
        return 0.0;
    }
    let references = slices.iter().filter(|slice| slice.is_reference).count();
    references as f64 / slices.len() as f64 * 100.0
}

/// I/P frame-size statistics computed in detailed mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSizeStatistics {
    /// Packet sizes of I-frames.
    pub i_frames: Option<SizeDistribution>,
    /// Packet sizes of P-frames.
    pub p_frames: Option<SizeDistribution>,
    /// Coefficient of variation over the I and P sizes together.
    pub size_cv: f64,
}

impl FrameSizeStatistics {
    /// Compute I/P size statistics from frame records.
    ///
    /// B and unknown frames do not contribute.
    pub fn compute(frames: &[FrameRecord]) -> Self {
        let sizes_of = |wanted: PictureType| -> Vec<u64> {
            frames
                .iter()
                .filter(|frame| frame.pict_type == wanted)
                .map(|frame| frame.packet_size)
                .collect()
        };
        let i_sizes = sizes_of(PictureType::I);
        let p_sizes = sizes_of(PictureType::P);

        let combined: Vec<u64> = i_sizes.iter().chain(&p_sizes).copied().collect();
        let size_cv = SizeDistribution::from_sizes(&combined)
            .map(|distribution| distribution.coefficient_of_variation())
            .unwrap_or(0.0);

        Self {
            i_frames: SizeDistribution::from_sizes(&i_sizes),
            p_frames: SizeDistribution::from_sizes(&p_sizes),
            size_cv,
        }
    }
}

/// The per-file numbers that feed the cross-file comparison table.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AnalysisSummary {
    /// Average bitrate in bits per second.
    pub average_bitrate: f64,
    /// Mean GOP size in frames.
    pub average_gop_size: f64,
    /// Bitrate equivalent of the largest frame, bits per second.
    pub peak_frame_bitrate: f64,
    /// Number of I-frames.
    pub i_frame_count: usize,
    /// Reference ratio in percent (0 when no slices were classified).
    pub reference_ratio: f64,
}

impl AnalysisSummary {
    /// Assemble a summary from the computed statistics.
    pub fn new(gops: &GopStatistics, bitrate: &BitrateStatistics, reference_ratio: f64) -> Self {
        Self {
            average_bitrate: bitrate.average_bitrate,
            average_gop_size: gops.mean,
            peak_frame_bitrate: bitrate.peak_frame_bitrate,
            i_frame_count: gops.keyframe_count,
            reference_ratio,
        }
    }
}
