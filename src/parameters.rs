//! Encoder settings reported at the stream and container level.

use serde::Serialize;

/// Stream and container level encoding parameters.
///
/// Values are kept as the strings the metadata source reported; a field is
/// `None` when the source did not report it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct EncodingParameters {
    /// Codec profile (e.g. `"High"`).
    pub profile: Option<String>,
    /// Codec level (e.g. `"41"`).
    pub level: Option<String>,
    /// Number of reference frames.
    pub refs: Option<String>,
    /// B-frame reorder depth.
    pub has_b_frames: Option<String>,
    /// Stream bit rate in bits per second.
    pub bit_rate: Option<String>,
    /// Maximum stream bit rate in bits per second.
    pub max_bit_rate: Option<String>,
    /// Bits per raw sample.
    pub bits_per_raw_sample: Option<String>,
    /// Container bit rate in bits per second.
    pub format_bit_rate: Option<String>,
    /// Container duration in seconds.
    pub duration: Option<String>,
}

impl EncodingParameters {
    /// Stream bit rate formatted in kbit/s (`"4500k"`), when it is numeric.
    pub fn bit_rate_kbps(&self) -> Option<String> {
        let bits: f64 = self.bit_rate.as_deref()?.trim().parse().ok()?;
        Some(format!("{:.0}k", bits / 1000.0))
    }
}
