//! Parsing of bitstream header traces.
//!
//! FFmpeg's `trace_headers` bitstream filter prints every syntax element of
//! the parameter sets and slice headers it passes through, one per line:
//!
//! ```text
//! [trace_headers @ 0x5581] Sequence Parameter Set
//! [trace_headers @ 0x5581] 0           profile_idc                 01100100 = 100
//! [trace_headers @ 0x5581] 8           constraint_set0_flag               0 = 0
//! ```
//!
//! [`parse_header_trace`] turns that text into schema-less field maps. The
//! fields are kept as strings; they are compared across files, never
//! interpreted.

use std::collections::BTreeMap;

use serde::Serialize;

/// Field name to traced value.
pub type HeaderFields = BTreeMap<String, String>;

/// Slice headers beyond this count are ignored.
pub const MAX_SLICE_HEADERS: usize = 5;

const SPS_MARKER: &str = "Sequence Parameter Set";
const PPS_MARKER: &str = "Picture Parameter Set";
const SLICE_MARKER: &str = "Slice Header";

/// Header fields extracted from one trace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct HeaderTrace {
    /// SPS fields; later parameter sets overwrite earlier values.
    pub sps: HeaderFields,
    /// PPS fields; later parameter sets overwrite earlier values.
    pub pps: HeaderFields,
    /// The first [`MAX_SLICE_HEADERS`] slice headers, in order.
    pub slices: Vec<HeaderFields>,
}

impl HeaderTrace {
    /// The first slice header, if any was traced.
    pub fn first_slice(&self) -> Option<&HeaderFields> {
        self.slices.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Sps,
    Pps,
    Slice,
}

/// Parse the text output of a header tracing filter.
pub fn parse_header_trace(text: &str) -> HeaderTrace {
    let mut trace = HeaderTrace::default();
    let mut section = Section::None;
    let mut slice = HeaderFields::new();

    for line in text.lines() {
        if line.contains(SLICE_MARKER) {
            if !slice.is_empty() {
                trace.slices.push(std::mem::take(&mut slice));
            }
            section = Section::Slice;
        } else if line.contains(SPS_MARKER) || line.contains(PPS_MARKER) {
            if !slice.is_empty() {
                trace.slices.push(std::mem::take(&mut slice));
            }
            section = if line.contains(SPS_MARKER) {
                Section::Sps
            } else {
                Section::Pps
            };
        } else if let Some((name, value)) = parse_field(line) {
            match section {
                Section::Sps => {
                    trace.sps.insert(name, value);
                }
                Section::Pps => {
                    trace.pps.insert(name, value);
                }
                Section::Slice => {
                    slice.insert(name, value);
                }
                Section::None => {}
            }
        }

        if trace.slices.len() >= MAX_SLICE_HEADERS {
            break;
        }
    }

    if !slice.is_empty() && trace.slices.len() < MAX_SLICE_HEADERS {
        trace.slices.push(slice);
    }

    log::debug!(
        "Parsed header trace: {} SPS fields, {} PPS fields, {} slice headers",
        trace.sps.len(),
        trace.pps.len(),
        trace.slices.len()
    );
    trace
}

/// Split `... name bits = value` into `(name, value)`.
///
/// Lines without exactly one `=` are not fields. A trailing token made only
/// of binary digits is the traced bit string and is skipped.
fn parse_field(line: &str) -> Option<(String, String)> {
    let (left, value) = line.split_once('=')?;
    if value.contains('=') {
        return None;
    }

    let mut tokens = left.split_whitespace().rev();
    let mut name = tokens.next()?;
    if is_bit_string(name) {
        name = tokens.next().unwrap_or(name);
    }

    Some((name.to_string(), value.trim().to_string()))
}

fn is_bit_string(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|byte| byte == b'0' || byte == b'1')
}
