//! Annex-B byte stream scanning.
//!
//! This module provides [`NalIterator`], a lazy scanner that walks an
//! immutable H.264 elementary stream and yields one [`NalUnit`] per
//! start-code-delimited segment. Units borrow their payload from the source
//! buffer; nothing is copied.
//!
//! Start codes are either `00 00 01` or `00 00 00 01` and are recognised at
//! any byte alignment. A unit's payload spans from the end of its start code
//! to the start of the next start code (or the end of the buffer). Segments
//! with an empty payload are skipped.
//!
//! # Example
//!
//! ```
//! use nalscope::nal::{self, NalUnitType};
//!
//! let stream = [0, 0, 0, 1, 0x67, 0x42, 0, 0, 1, 0x68, 0xce, 0, 0, 1, 0x65, 0x88];
//! let types: Vec<NalUnitType> = nal::scan(&stream).map(|unit| unit.unit_type()).collect();
//! assert_eq!(types, [NalUnitType::Sps, NalUnitType::Pps, NalUnitType::SliceIdr]);
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

/// The three-byte start code prefix shared by both start code forms.
pub const START_CODE_PREFIX: [u8; 3] = [0x00, 0x00, 0x01];

/// Number of distinct values of the 5-bit `nal_unit_type` field.
pub const NAL_TYPE_COUNT: usize = 32;

/// Which start code form delimited a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartCode {
    /// `00 00 01`
    Short,
    /// `00 00 00 01`
    Long,
}

impl StartCode {
    /// Length of the start code in bytes.
    pub fn len(self) -> usize {
        match self {
            StartCode::Short => 3,
            StartCode::Long => 4,
        }
    }
}

/// H.264 NAL unit types (Table 7-1), as far as this crate names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum NalUnitType {
    /// Coded slice of a non-IDR picture.
    Slice,
    /// Coded slice data partition A.
    SliceDataPartitionA,
    /// Coded slice data partition B.
    SliceDataPartitionB,
    /// Coded slice data partition C.
    SliceDataPartitionC,
    /// Coded slice of an IDR picture.
    SliceIdr,
    /// Supplemental enhancement information.
    Sei,
    /// Sequence parameter set.
    Sps,
    /// Picture parameter set.
    Pps,
    /// Access unit delimiter.
    AccessUnitDelimiter,
    /// End of sequence.
    EndOfSequence,
    /// End of stream.
    EndOfStream,
    /// Filler data.
    FillerData,
    /// Sequence parameter set extension.
    SpsExtension,
    /// Any other value in `0..=31`.
    Other(u8),
}

impl NalUnitType {
    /// Map a raw 5-bit type value.
    pub fn from_type_id(type_id: u8) -> Self {
        match type_id & 0x1f {
            1 => Self::Slice,
            2 => Self::SliceDataPartitionA,
            3 => Self::SliceDataPartitionB,
            4 => Self::SliceDataPartitionC,
            5 => Self::SliceIdr,
            6 => Self::Sei,
            7 => Self::Sps,
            8 => Self::Pps,
            9 => Self::AccessUnitDelimiter,
            10 => Self::EndOfSequence,
            11 => Self::EndOfStream,
            12 => Self::FillerData,
            13 => Self::SpsExtension,
            other => Self::Other(other),
        }
    }

    /// The raw 5-bit type value.
    pub fn type_id(self) -> u8 {
        match self {
            Self::Slice => 1,
            Self::SliceDataPartitionA => 2,
            Self::SliceDataPartitionB => 3,
            Self::SliceDataPartitionC => 4,
            Self::SliceIdr => 5,
            Self::Sei => 6,
            Self::Sps => 7,
            Self::Pps => 8,
            Self::AccessUnitDelimiter => 9,
            Self::EndOfSequence => 10,
            Self::EndOfStream => 11,
            Self::FillerData => 12,
            Self::SpsExtension => 13,
            Self::Other(id) => id,
        }
    }

    /// Whether the type carries coded slice data (types 1-5).
    pub fn is_slice(self) -> bool {
        matches!(
            self,
            Self::Slice
                | Self::SliceDataPartitionA
                | Self::SliceDataPartitionB
                | Self::SliceDataPartitionC
                | Self::SliceIdr
        )
    }
}

impl Display for NalUnitType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Slice => write!(f, "Slice"),
            Self::SliceDataPartitionA => write!(f, "SliceDPA"),
            Self::SliceDataPartitionB => write!(f, "SliceDPB"),
            Self::SliceDataPartitionC => write!(f, "SliceDPC"),
            Self::SliceIdr => write!(f, "IDR"),
            Self::Sei => write!(f, "SEI"),
            Self::Sps => write!(f, "SPS"),
            Self::Pps => write!(f, "PPS"),
            Self::AccessUnitDelimiter => write!(f, "AUD"),
            Self::EndOfSequence => write!(f, "EndOfSeq"),
            Self::EndOfStream => write!(f, "EndOfStream"),
            Self::FillerData => write!(f, "Filler"),
            Self::SpsExtension => write!(f, "SPSExt"),
            Self::Other(id) => write!(f, "Other({id})"),
        }
    }
}

/// One NAL unit located in a byte stream.
///
/// `payload` is `&source[offset..offset + length]` and starts with the NAL
/// header byte. `length` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalUnit<'a> {
    /// Low five bits of the header byte, always in `0..=31`.
    pub nal_type: u8,
    /// Byte offset of the payload within the source buffer (after the start code).
    pub offset: usize,
    /// Payload length in bytes.
    pub length: usize,
    /// The payload, header byte included.
    pub payload: &'a [u8],
    /// The start code that preceded the payload.
    pub start_code: StartCode,
}

impl<'a> NalUnit<'a> {
    /// Named form of [`nal_type`](Self::nal_type).
    pub fn unit_type(&self) -> NalUnitType {
        NalUnitType::from_type_id(self.nal_type)
    }

    /// The NAL header byte.
    pub fn header(&self) -> u8 {
        self.payload[0]
    }

    /// The 2-bit `nal_ref_idc` field of the header.
    ///
    /// Reference classification does not use this field unless
    /// [`ReferencePolicy::RefIdc`](crate::ReferencePolicy::RefIdc) is selected.
    pub fn ref_idc(&self) -> u8 {
        (self.header() >> 5) & 0x03
    }

    /// Offset of the start code that introduced this unit.
    pub fn start_code_offset(&self) -> usize {
        self.offset - self.start_code.len()
    }
}

/// Find the next start code at or after `from`.
///
/// Returns the position of the first start code byte and the form found. A
/// `00 00 01` preceded by a zero byte at or after `from` is reported as the
/// four-byte form.
pub fn find_start_code(data: &[u8], from: usize) -> Option<(usize, StartCode)> {
    let window = data.get(from..)?;
    let relative = window
        .windows(START_CODE_PREFIX.len())
        .position(|bytes| bytes == START_CODE_PREFIX)?;
    let position = from + relative;

    if relative > 0 && data[position - 1] == 0x00 {
        Some((position - 1, StartCode::Long))
    } else {
        Some((position, StartCode::Short))
    }
}

/// Scan `data` for NAL units.
///
/// The returned iterator is lazy. Calling `scan` again (or cloning a fresh
/// iterator) restarts from the beginning of the buffer.
pub fn scan(data: &[u8]) -> NalIterator<'_> {
    NalIterator::new(data)
}

/// Count units per NAL type over the whole buffer.
pub fn type_histogram(data: &[u8]) -> [u64; NAL_TYPE_COUNT] {
    let mut histogram = [0_u64; NAL_TYPE_COUNT];
    for unit in scan(data) {
        histogram[unit.nal_type as usize] += 1;
    }
    histogram
}

/// A lazy iterator over the NAL units of an Annex-B byte stream.
#[derive(Debug, Clone)]
pub struct NalIterator<'a> {
    data: &'a [u8],
    /// Start code of the unit to emit next, `None` once exhausted.
    pending: Option<(usize, StartCode)>,
}

impl<'a> NalIterator<'a> {
    /// Position the scanner on the first start code of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        let pending = find_start_code(data, 0);
        if pending.is_none() {
            log::debug!("No start code in {} byte buffer", data.len());
        }
        Self { data, pending }
    }
}

impl<'a> Iterator for NalIterator<'a> {
    type Item = NalUnit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (position, start_code) = self.pending?;
            let offset = position + start_code.len();
            let following = find_start_code(self.data, offset);
            let end = following.map_or(self.data.len(), |(next, _)| next);
            self.pending = following;

            if end <= offset {
                log::trace!("Skipping empty NAL unit at offset {offset}");
                continue;
            }

            let payload = &self.data[offset..end];
            let unit = NalUnit {
                nal_type: payload[0] & 0x1f,
                offset,
                length: payload.len(),
                payload,
                start_code,
            };
            log::trace!(
                "NAL unit type={} offset={} length={}",
                unit.nal_type,
                unit.offset,
                unit.length
            );
            return Some(unit);
        }
    }
}

impl std::iter::FusedIterator for NalIterator<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_start_code_claims_leading_zero() {
        let data = [0x00, 0x00, 0x00, 0x01, 0x65];
        assert_eq!(find_start_code(&data, 0), Some((0, StartCode::Long)));
        // Searching past the zero byte only sees the short form.
        assert_eq!(find_start_code(&data, 1), Some((1, StartCode::Short)));
    }

    #[test]
    fn short_start_code_at_odd_alignment() {
        let data = [0xff, 0x00, 0x00, 0x01, 0x41, 0x9a];
        let units: Vec<_> = scan(&data).collect();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].offset, 4);
        assert_eq!(units[0].length, 2);
        assert_eq!(units[0].start_code, StartCode::Short);
        assert_eq!(units[0].nal_type, 1);
    }

    #[test]
    fn back_to_back_start_codes_are_skipped() {
        let data = [0x00, 0x00, 0x01, 0x00, 0x00, 0x01, 0x09, 0xf0];
        let units: Vec<_> = scan(&data).collect();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].unit_type(), NalUnitType::AccessUnitDelimiter);
    }

    #[test]
    fn ref_idc_is_read_from_header() {
        let data = [0x00, 0x00, 0x01, 0x21, 0x00];
        let unit = scan(&data).next().unwrap();
        assert_eq!(unit.nal_type, 1);
        assert_eq!(unit.ref_idc(), 1);
    }

    #[test]
    fn histogram_counts_every_unit() {
        let data = [
            0x00, 0x00, 0x00, 0x01, 0x67, 0x00, 0x00, 0x01, 0x68, 0x00, 0x00, 0x01, 0x65, 0x00,
            0x00, 0x01, 0x41,
        ];
        let histogram = type_histogram(&data);
        assert_eq!(histogram[7], 1);
        assert_eq!(histogram[8], 1);
        assert_eq!(histogram[5], 1);
        assert_eq!(histogram[1], 1);
        assert_eq!(histogram.iter().sum::<u64>(), 4);
    }
}
