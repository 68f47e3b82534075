//! Semantic classification of NAL units.
//!
//! [`classify`] maps a [`NalUnit`] to a [`NalRole`]: a parameter set, a coded
//! slice, or anything else. For slices it derives whether the unit is an IDR
//! picture and whether it is a reference picture.
//!
//! Referenceability follows a deliberately simplified rule by default
//! ([`ReferencePolicy::NalType`]): NAL types 1, 2 and 5 are reference-bearing,
//! data partitions B and C (types 3 and 4) are not, and `nal_ref_idc` is
//! ignored. Downstream statistics depend on this exact rule.
//! [`ReferencePolicy::RefIdc`] is an opt-in alternative that reads the
//! header's `nal_ref_idc` field instead.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::nal::NalUnit;

/// Which parameter set a unit carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterSetKind {
    /// Sequence parameter set (type 7).
    Sps,
    /// Picture parameter set (type 8).
    Pps,
}

/// Slice type as far as it can be told from the NAL type alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliceType {
    /// Intra slice of an IDR picture.
    I,
    /// Predicted or bi-predicted; telling them apart needs the slice header.
    PorB,
}

impl Display for SliceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SliceType::I => write!(f, "I"),
            SliceType::PorB => write!(f, "P/B"),
        }
    }
}

/// How slice referenceability is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferencePolicy {
    /// Types 1, 2 and 5 are reference pictures; 3 and 4 are not.
    #[default]
    NalType,
    /// A slice is a reference picture when its `nal_ref_idc` is non-zero.
    RefIdc,
}

/// Classification of a coded slice unit (NAL types 1-5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceClassification {
    /// Raw NAL type the classification was derived from.
    pub nal_type: u8,
    /// `true` iff the unit is an IDR slice (type 5).
    pub is_idr: bool,
    /// Whether the slice belongs to a reference picture.
    pub is_reference: bool,
    /// `I` for IDR slices, `P/B` otherwise.
    pub slice_type: SliceType,
    /// Size of the NAL unit payload in bytes.
    pub size: usize,
}

/// Semantic role of a NAL unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalRole {
    /// SPS or PPS.
    ParameterSet(ParameterSetKind),
    /// A coded slice.
    Slice(SliceClassification),
    /// Any other type; excluded from reference and GOP statistics.
    Other,
}

impl NalRole {
    /// The slice classification, if this is a slice.
    pub fn as_slice(&self) -> Option<&SliceClassification> {
        match self {
            NalRole::Slice(slice) => Some(slice),
            _ => None,
        }
    }
}

/// Classify a unit with the default [`ReferencePolicy::NalType`] rule.
pub fn classify(unit: &NalUnit<'_>) -> NalRole {
    classify_with_policy(unit, ReferencePolicy::NalType)
}

/// Classify a unit, deciding referenceability with `policy`.
pub fn classify_with_policy(unit: &NalUnit<'_>, policy: ReferencePolicy) -> NalRole {
    match unit.nal_type {
        7 => NalRole::ParameterSet(ParameterSetKind::Sps),
        8 => NalRole::ParameterSet(ParameterSetKind::Pps),
        nal_type @ 1..=5 => {
            let is_idr = nal_type == 5;
            let is_reference = match policy {
                ReferencePolicy::NalType => matches!(nal_type, 1 | 2 | 5),
                ReferencePolicy::RefIdc => unit.ref_idc() != 0,
            };
            NalRole::Slice(SliceClassification {
                nal_type,
                is_idr,
                is_reference,
                slice_type: if is_idr { SliceType::I } else { SliceType::PorB },
                size: unit.length,
            })
        }
        _ => NalRole::Other,
    }
}
