//! Group of Pictures segmentation.
//!
//! This module partitions a frame sequence into [`Gop`]s. Every I-frame
//! closes the open group and starts a new one; all other frames join the
//! open group. Boundaries depend only on [`FrameRecord::pict_type`], never
//! on NAL-level slice classification.
//!
//! A sequence that does not begin with an I-frame yields a leading open GOP
//! starting with a non-I frame. An empty sequence yields no GOPs.
//!
//! # Example
//!
//! ```
//! use nalscope::{frame::frames_from_pattern, gop};
//!
//! let frames = frames_from_pattern("IPPIP");
//! let sizes: Vec<usize> = gop::segment(&frames).iter().map(|g| g.len()).collect();
//! assert_eq!(sizes, [3, 2]);
//! ```

use crate::frame::{FrameRecord, PictureType};

/// A run of consecutive frames beginning at a keyframe.
///
/// Borrows a contiguous, non-empty slice of the analyzed frame sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gop<'a> {
    frames: &'a [FrameRecord],
}

impl<'a> Gop<'a> {
    /// Frames of this group in input order.
    pub fn frames(&self) -> &'a [FrameRecord] {
        self.frames
    }

    /// Number of frames in the group (never zero).
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// The frame that opened the group.
    pub fn first(&self) -> &'a FrameRecord {
        &self.frames[0]
    }

    /// `false` only for a leading open GOP.
    pub fn starts_with_keyframe(&self) -> bool {
        self.first().is_keyframe()
    }

    /// Picture types of the group's frames in order.
    pub fn picture_types(&self) -> Vec<PictureType> {
        self.frames.iter().map(|frame| frame.pict_type).collect()
    }

    /// Number of I-frames in the group.
    pub fn keyframe_count(&self) -> usize {
        self.frames.iter().filter(|frame| frame.is_keyframe()).count()
    }

    /// Sum of the group's packet sizes in bytes.
    pub fn total_bytes(&self) -> u64 {
        self.frames.iter().map(|frame| frame.packet_size).sum()
    }
}

/// Lazy GOP segmentation over a frame slice.
///
/// The open group is the slice starting at `start`; it is emitted when the
/// next I-frame or the end of the input is reached.
#[derive(Debug, Clone)]
pub struct GopIterator<'a> {
    frames: &'a [FrameRecord],
    start: usize,
}

impl<'a> GopIterator<'a> {
    /// Create an iterator over the GOPs of `frames`.
    pub fn new(frames: &'a [FrameRecord]) -> Self {
        Self { frames, start: 0 }
    }
}

impl<'a> Iterator for GopIterator<'a> {
    type Item = Gop<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.start >= self.frames.len() {
            return None;
        }

        let open = &self.frames[self.start..];
        let end = open[1..]
            .iter()
            .position(FrameRecord::is_keyframe)
            .map_or(open.len(), |position| position + 1);

        self.start += end;
        Some(Gop {
            frames: &open[..end],
        })
    }
}

impl std::iter::FusedIterator for GopIterator<'_> {}

/// Partition `frames` into GOPs.
pub fn segment(frames: &[FrameRecord]) -> Vec<Gop<'_>> {
    log::debug!("Segmenting {} frames into GOPs", frames.len());
    GopIterator::new(frames).collect()
}
