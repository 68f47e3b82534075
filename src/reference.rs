//! Reference-frame usage analysis.
//!
//! [`ReferenceFrameAnalysis`] walks the NAL units of an elementary stream,
//! records whether parameter sets were seen, and keeps the classification
//! of every slice unit. [`ReferenceFrameReport`] condenses that into counts,
//! the reference ratio, and size statistics per class.
//!
//! # Example
//!
//! ```
//! use nalscope::{ReferenceFrameAnalysis, ReferencePolicy};
//!
//! let stream = [
//!     0, 0, 0, 1, 0x67, 0x42, 0, 0, 1, 0x68, 0xce,
//!     0, 0, 1, 0x65, 0x88, 0x84, 0, 0, 1, 0x41, 0x9a, 0, 0, 1, 0x03, 0x9e,
//! ];
//! let analysis = ReferenceFrameAnalysis::from_stream(&stream, ReferencePolicy::NalType);
//! let report = analysis.report();
//! assert_eq!(report.idr_count, 1);
//! assert_eq!(report.non_idr_reference_count, 1);
//! assert_eq!(report.non_reference_count, 1);
//! ```

use serde::Serialize;

use crate::classify::{
    NalRole, ParameterSetKind, ReferencePolicy, SliceClassification, classify_with_policy,
};
use crate::nal::{self, NalUnit};
use crate::statistics::{SizeDistribution, reference_ratio};

/// Raw result of classifying every unit of a stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceFrameAnalysis {
    /// At least one SPS unit was present.
    pub has_sps: bool,
    /// At least one PPS unit was present.
    pub has_pps: bool,
    /// Classification of every slice unit, in stream order.
    pub slices: Vec<SliceClassification>,
    /// Total number of NAL units scanned.
    pub unit_count: usize,
    /// Units that were neither slices nor parameter sets.
    pub other_count: usize,
}

impl ReferenceFrameAnalysis {
    /// Scan and classify an Annex-B buffer.
    pub fn from_stream(data: &[u8], policy: ReferencePolicy) -> Self {
        log::debug!(
            "Analyzing reference frames in {} byte stream ({policy:?})",
            data.len()
        );
        Self::from_units(nal::scan(data), policy)
    }

    /// Classify already-scanned units.
    pub fn from_units<'a, I>(units: I, policy: ReferencePolicy) -> Self
    where
        I: IntoIterator<Item = NalUnit<'a>>,
    {
        let mut analysis = Self::default();
        for unit in units {
            analysis.unit_count += 1;
            match classify_with_policy(&unit, policy) {
                NalRole::ParameterSet(ParameterSetKind::Sps) => analysis.has_sps = true,
                NalRole::ParameterSet(ParameterSetKind::Pps) => analysis.has_pps = true,
                NalRole::Slice(slice) => analysis.slices.push(slice),
                NalRole::Other => analysis.other_count += 1,
            }
        }
        analysis
    }

    /// Condense the analysis into a report.
    pub fn report(&self) -> ReferenceFrameReport {
        let idr_sizes = sizes_where(&self.slices, |slice| slice.is_idr);
        let reference_sizes = sizes_where(&self.slices, is_non_idr_reference);
        let non_reference_sizes = sizes_where(&self.slices, |slice| !slice.is_reference);

        ReferenceFrameReport {
            has_sps: self.has_sps,
            has_pps: self.has_pps,
            total_slices: self.slices.len(),
            idr_count: idr_sizes.len(),
            non_idr_reference_count: reference_sizes.len(),
            non_reference_count: non_reference_sizes.len(),
            reference_ratio: reference_ratio(&self.slices),
            idr_sizes: SizeDistribution::from_sizes(&idr_sizes),
            reference_sizes: SizeDistribution::from_sizes(&reference_sizes),
            non_reference_sizes: SizeDistribution::from_sizes(&non_reference_sizes),
        }
    }
}

fn sizes_where(
    slices: &[SliceClassification],
    predicate: impl Fn(&SliceClassification) -> bool,
) -> Vec<u64> {
    slices
        .iter()
        .filter(|slice| predicate(slice))
        .map(|slice| slice.size as u64)
        .collect()
}

/// Non-IDR slices (types 1 and 2) that are classified as reference.
fn is_non_idr_reference(slice: &SliceClassification) -> bool {
    matches!(slice.nal_type, 1 | 2) && slice.is_reference
}

/// Reference-frame usage of one stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceFrameReport {
    /// At least one SPS unit was present.
    pub has_sps: bool,
    /// At least one PPS unit was present.
    pub has_pps: bool,
    /// Number of classified slice units.
    pub total_slices: usize,
    /// IDR slices.
    pub idr_count: usize,
    /// Non-IDR reference slices.
    pub non_idr_reference_count: usize,
    /// Non-reference slices.
    pub non_reference_count: usize,
    /// Reference slices as a percentage of all slices.
    pub reference_ratio: f64,
    /// Sizes of IDR slice units.
    pub idr_sizes: Option<SizeDistribution>,
    /// Sizes of non-IDR reference slice units.
    pub reference_sizes: Option<SizeDistribution>,
    /// Sizes of non-reference slice units.
    pub non_reference_sizes: Option<SizeDistribution>,
}

impl ReferenceFrameReport {
    /// Both parameter set kinds were seen.
    pub fn has_parameter_sets(&self) -> bool {
        self.has_sps && self.has_pps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stream_reports_zeroes() {
        let report = ReferenceFrameAnalysis::from_stream(&[], ReferencePolicy::NalType).report();
        assert_eq!(report.total_slices, 0);
        assert_eq!(report.reference_ratio, 0.0);
        assert!(report.idr_sizes.is_none());
        assert!(!report.has_parameter_sets());
    }

    #[test]
    fn other_units_are_counted_but_not_classified() {
        let stream = [0, 0, 1, 0x09, 0xf0, 0, 0, 1, 0x06, 0x05, 0x01];
        let analysis = ReferenceFrameAnalysis::from_stream(&stream, ReferencePolicy::NalType);
        assert_eq!(analysis.unit_count, 2);
        assert_eq!(analysis.other_count, 2);
        assert!(analysis.slices.is_empty());
    }
}
