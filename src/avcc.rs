//! Conversion from length-prefixed (AVCC) to start-code (Annex-B) framing.
//!
//! MP4 and Matroska store H.264 samples as NAL units prefixed by a 1-4 byte
//! big-endian length, with the parameter sets kept out of band in an
//! `AVCDecoderConfigurationRecord` (the `avcC` box). The scanner in
//! [`nal`](crate::nal) needs Annex-B, so container packets are rewritten
//! with long start codes and the SPS/PPS from the record are emitted first.
//!
//! # Example
//!
//! ```
//! use nalscope::avcc::avcc_to_annex_b;
//!
//! let sample = [0, 0, 0, 2, 0x65, 0x88, 0, 0, 0, 1, 0x06];
//! assert_eq!(
//!     avcc_to_annex_b(&sample, 4),
//!     [0, 0, 0, 1, 0x65, 0x88, 0, 0, 0, 1, 0x06]
//! );
//! ```

use crate::error::AcquisitionError;

const LONG_START_CODE: [u8; 4] = [0, 0, 0, 1];

/// Parsed `AVCDecoderConfigurationRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvccConfig {
    /// Sequence parameter set NAL units.
    pub sps: Vec<Vec<u8>>,
    /// Picture parameter set NAL units.
    pub pps: Vec<Vec<u8>>,
    /// Size of the NAL length prefix in bytes (1, 2, or 4).
    pub length_size: usize,
}

impl AvccConfig {
    /// Parse a configuration record.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError::MalformedOutput`] if the record is
    /// truncated or does not start with configuration version 1.
    pub fn parse(data: &[u8]) -> Result<Self, AcquisitionError> {
        if data.len() < 7 || data[0] != 1 {
            return Err(malformed("avcC record too short or wrong version"));
        }
        let length_size = usize::from(data[4] & 0x03) + 1;

        let mut position = 5;
        let sps_count = usize::from(data[position] & 0x1f);
        position += 1;
        let sps = read_parameter_sets(data, &mut position, sps_count)?;

        let pps_count = data
            .get(position)
            .map(|&count| usize::from(count))
            .ok_or_else(|| malformed("missing PPS count"))?;
        position += 1;
        let pps = read_parameter_sets(data, &mut position, pps_count)?;

        Ok(Self {
            sps,
            pps,
            length_size,
        })
    }

    /// The parameter sets as an Annex-B prefix: every SPS, then every PPS.
    pub fn annex_b_parameter_sets(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for unit in self.sps.iter().chain(&self.pps) {
            out.extend_from_slice(&LONG_START_CODE);
            out.extend_from_slice(unit);
        }
        out
    }
}

fn read_parameter_sets(
    data: &[u8],
    position: &mut usize,
    count: usize,
) -> Result<Vec<Vec<u8>>, AcquisitionError> {
    let mut units = Vec::with_capacity(count);
    for _ in 0..count {
        let header = data
            .get(*position..*position + 2)
            .ok_or_else(|| malformed("truncated parameter set length"))?;
        let length = usize::from(u16::from_be_bytes([header[0], header[1]]));
        *position += 2;

        let unit = data
            .get(*position..*position + length)
            .ok_or_else(|| malformed("truncated parameter set"))?;
        units.push(unit.to_vec());
        *position += length;
    }
    Ok(units)
}

fn malformed(reason: &str) -> AcquisitionError {
    AcquisitionError::MalformedOutput {
        tool: "avcC",
        reason: reason.to_string(),
    }
}

/// Rewrite one length-prefixed sample into Annex-B framing.
///
/// Conversion stops at the first length that runs past the end of `data`.
/// Zero-length units are dropped.
pub fn avcc_to_annex_b(data: &[u8], length_size: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 4);
    let mut position = 0;

    while position + length_size <= data.len() {
        let length = data[position..position + length_size]
            .iter()
            .fold(0usize, |acc, &byte| (acc << 8) | usize::from(byte));
        position += length_size;

        let Some(unit) = data.get(position..position + length) else {
            log::trace!("Truncated AVCC unit at offset {position}");
            break;
        };
        if !unit.is_empty() {
            out.extend_from_slice(&LONG_START_CODE);
            out.extend_from_slice(unit);
        }
        position += length;
    }
    out
}
