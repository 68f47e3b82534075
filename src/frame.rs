//! Per-frame metadata as reported by a [`MediaSource`](crate::MediaSource).

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::Serialize;

/// Picture type of a coded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum PictureType {
    /// Intra-coded picture; starts a new GOP.
    I,
    /// Predicted picture.
    P,
    /// Bi-predicted picture.
    B,
    /// Anything else the metadata source reported (`?`, `S`, `SI`, ...).
    #[default]
    Unknown,
}

impl PictureType {
    /// Short label used in GOP previews.
    pub fn as_str(self) -> &'static str {
        match self {
            PictureType::I => "I",
            PictureType::P => "P",
            PictureType::B => "B",
            PictureType::Unknown => "?",
        }
    }
}

impl Display for PictureType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for PictureType {
    type Err = std::convert::Infallible;

    /// Unrecognised labels parse as [`PictureType::Unknown`].
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value.trim() {
            "I" | "i" => PictureType::I,
            "P" | "p" => PictureType::P,
            "B" | "b" => PictureType::B,
            _ => PictureType::Unknown,
        })
    }
}

/// One coded picture as reported by the metadata collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecord {
    /// Zero-based position in decoder output order.
    pub index: u64,
    /// Picture type.
    pub pict_type: PictureType,
    /// Presentation timestamp in stream time base units, if reported.
    pub presentation_timestamp: Option<i64>,
    /// Size of the frame's packet in bytes.
    pub packet_size: u64,
}

impl FrameRecord {
    /// Convenience constructor without a timestamp.
    pub fn new(index: u64, pict_type: PictureType, packet_size: u64) -> Self {
        Self {
            index,
            pict_type,
            presentation_timestamp: None,
            packet_size,
        }
    }

    /// Whether this frame opens a GOP.
    pub fn is_keyframe(&self) -> bool {
        self.pict_type == PictureType::I
    }
}

/// Build frame records from a compact picture-type string such as `"IPPBP"`.
///
/// Whitespace is ignored; every other character becomes one frame with a
/// zero packet size. Mostly useful for tests and quick experiments.
pub fn frames_from_pattern(pattern: &str) -> Vec<FrameRecord> {
    pattern
        .chars()
        .filter(|c| !c.is_whitespace())
        .enumerate()
        .map(|(index, label)| {
            let pict_type = label
                .to_string()
                .parse()
                .unwrap_or(PictureType::Unknown);
            FrameRecord::new(index as u64, pict_type, 0)
        })
        .collect()
}
