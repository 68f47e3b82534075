//! The acquisition port.
//!
//! The analyzer never decodes or demuxes media itself. Everything it needs
//! from a media file comes through a [`MediaSource`]:
//!
//! * per-frame metadata ([`FrameRecord`]s in output order),
//! * the raw Annex-B elementary stream of the video track,
//! * optionally, a header trace and encoder-level parameters.
//!
//! [`FfmpegTools`](crate::FfmpegTools) implements the port by running the
//! `ffprobe` and `ffmpeg` executables. Tests implement it with synthetic
//! data.

use std::path::Path;

use crate::error::AcquisitionError;
use crate::frame::FrameRecord;
use crate::parameters::EncodingParameters;

/// Supplier of raw analysis inputs for a media file.
///
/// Implementations must be [`Send`] and [`Sync`] so a single source can
/// serve parallel workers analyzing different files.
pub trait MediaSource: Send + Sync {
    /// Per-frame metadata of the first video stream, in the order the
    /// decoder outputs frames.
    fn acquire_frame_metadata(&self, path: &Path) -> Result<Vec<FrameRecord>, AcquisitionError>;

    /// The video stream as a start-code delimited Annex-B byte buffer.
    fn acquire_elementary_stream(&self, path: &Path) -> Result<Vec<u8>, AcquisitionError>;

    /// Text output of a header tracing filter.
    fn acquire_header_trace(&self, _path: &Path) -> Result<String, AcquisitionError> {
        Err(AcquisitionError::Unsupported("header trace"))
    }

    /// Stream and container level encoder settings.
    fn acquire_encoding_parameters(
        &self,
        _path: &Path,
    ) -> Result<EncodingParameters, AcquisitionError> {
        Err(AcquisitionError::Unsupported("encoding parameters"))
    }
}

impl<S: MediaSource + ?Sized> MediaSource for &S {
    fn acquire_frame_metadata(&self, path: &Path) -> Result<Vec<FrameRecord>, AcquisitionError> {
        (**self).acquire_frame_metadata(path)
    }

    fn acquire_elementary_stream(&self, path: &Path) -> Result<Vec<u8>, AcquisitionError> {
        (**self).acquire_elementary_stream(path)
    }

    fn acquire_header_trace(&self, path: &Path) -> Result<String, AcquisitionError> {
        (**self).acquire_header_trace(path)
    }

    fn acquire_encoding_parameters(
        &self,
        path: &Path,
    ) -> Result<EncodingParameters, AcquisitionError> {
        (**self).acquire_encoding_parameters(path)
    }
}
