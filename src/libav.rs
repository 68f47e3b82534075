//! In-process [`MediaSource`] backed by the FFmpeg libraries.
//!
//! Requires the `libav` feature. The container is demuxed and the video
//! stream decoded with [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next);
//! no external executables are involved. Header traces are not available
//! from this source.

use std::collections::HashMap;
use std::path::Path;

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::{Id, context::Context as CodecContext},
    format::{self, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    picture,
};

use crate::avcc::{AvccConfig, avcc_to_annex_b};
use crate::error::AcquisitionError;
use crate::frame::{FrameRecord, PictureType};
use crate::parameters::EncodingParameters;
use crate::source::MediaSource;

/// Demuxes and decodes with the linked FFmpeg libraries.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibavSource;

impl LibavSource {
    /// Create the source.
    pub fn new() -> Self {
        Self
    }
}

fn open(path: &Path) -> Result<(Input, usize), AcquisitionError> {
    ffmpeg_next::init()?;
    let input = format::input(&path)?;
    let stream_index = input
        .streams()
        .best(Type::Video)
        .map(|stream| stream.index())
        .ok_or(AcquisitionError::NoVideoStream)?;
    Ok((input, stream_index))
}

fn picture_type(kind: picture::Type) -> PictureType {
    match kind {
        picture::Type::I => PictureType::I,
        picture::Type::P => PictureType::P,
        picture::Type::B => PictureType::B,
        _ => PictureType::Unknown,
    }
}

/// Raw `extradata` of the stream's codec parameters.
fn extradata(parameters: &ffmpeg_next::codec::Parameters) -> Vec<u8> {
    // SAFETY: `parameters` wraps a valid AVCodecParameters for the lifetime
    // of the borrow; extradata is either null or `extradata_size` bytes.
    unsafe {
        let raw = parameters.as_ptr();
        let size = usize::try_from((*raw).extradata_size).unwrap_or(0);
        if (*raw).extradata.is_null() || size == 0 {
            Vec::new()
        } else {
            std::slice::from_raw_parts((*raw).extradata, size).to_vec()
        }
    }
}

impl MediaSource for LibavSource {
    fn acquire_frame_metadata(&self, path: &Path) -> Result<Vec<FrameRecord>, AcquisitionError> {
        log::debug!("Decoding frame metadata of {} with libav", path.display());
        let (mut input, stream_index) = open(path)?;
        let parameters = input
            .stream(stream_index)
            .ok_or(AcquisitionError::NoVideoStream)?
            .parameters();
        let mut decoder = CodecContext::from_parameters(parameters)?
            .decoder()
            .video()?;

        let mut sizes_by_pts: HashMap<i64, u64> = HashMap::new();
        let mut sizes_in_order: Vec<u64> = Vec::new();
        let mut decoded: Vec<(PictureType, Option<i64>)> = Vec::new();
        let mut frame = VideoFrame::empty();

        let mut receive = |decoder: &mut ffmpeg_next::decoder::Video,
                           decoded: &mut Vec<(PictureType, Option<i64>)>| {
            while decoder.receive_frame(&mut frame).is_ok() {
                let pts = frame.timestamp().or(frame.pts());
                decoded.push((picture_type(frame.kind()), pts));
            }
        };

        for (stream, packet) in input.packets() {
            if stream.index() != stream_index {
                continue;
            }
            let size = packet.size() as u64;
            if let Some(pts) = packet.pts() {
                sizes_by_pts.insert(pts, size);
            }
            sizes_in_order.push(size);

            match decoder.send_packet(&packet) {
                Ok(()) | Err(FfmpegError::Other { .. }) => {}
                Err(error) => return Err(error.into()),
            }
            receive(&mut decoder, &mut decoded);
        }
        decoder.send_eof()?;
        receive(&mut decoder, &mut decoded);

        let frames = decoded
            .into_iter()
            .enumerate()
            .map(|(index, (pict_type, pts))| FrameRecord {
                index: index as u64,
                pict_type,
                presentation_timestamp: pts,
                packet_size: pts
                    .and_then(|pts| sizes_by_pts.get(&pts).copied())
                    .or_else(|| sizes_in_order.get(index).copied())
                    .unwrap_or(0),
            })
            .collect::<Vec<_>>();
        log::debug!("Decoded {} frames", frames.len());
        Ok(frames)
    }

    fn acquire_elementary_stream(&self, path: &Path) -> Result<Vec<u8>, AcquisitionError> {
        log::debug!("Demuxing elementary stream of {} with libav", path.display());
        let (mut input, stream_index) = open(path)?;
        let parameters = input
            .stream(stream_index)
            .ok_or(AcquisitionError::NoVideoStream)?
            .parameters();
        if parameters.id() != Id::H264 {
            return Err(AcquisitionError::MalformedOutput {
                tool: "libav",
                reason: format!("video codec is {:?}, not H.264", parameters.id()),
            });
        }

        let extradata = extradata(&parameters);
        // avcC records start with configuration version 1; Annex-B extradata
        // starts with a start code.
        let avcc = if extradata.first() == Some(&1) {
            Some(AvccConfig::parse(&extradata)?)
        } else {
            None
        };
        let mut out = match &avcc {
            Some(config) => config.annex_b_parameter_sets(),
            None => extradata,
        };

        let mut packet = Packet::empty();
        loop {
            match packet.read(&mut input) {
                Ok(()) => {}
                Err(FfmpegError::Eof) => break,
                Err(error) => return Err(error.into()),
            }
            if packet.stream() != stream_index {
                continue;
            }
            let Some(data) = packet.data() else {
                continue;
            };
            match &avcc {
                Some(config) => out.extend_from_slice(&avcc_to_annex_b(data, config.length_size)),
                None => out.extend_from_slice(data),
            }
        }

        log::debug!("Demuxed {} stream bytes", out.len());
        Ok(out)
    }

    fn acquire_encoding_parameters(
        &self,
        path: &Path,
    ) -> Result<EncodingParameters, AcquisitionError> {
        let (input, stream_index) = open(path)?;
        let stream = input
            .stream(stream_index)
            .ok_or(AcquisitionError::NoVideoStream)?;
        let context = CodecContext::from_parameters(stream.parameters())?;
        let decoder = context.decoder().video()?;

        let bit_rate = decoder.bit_rate();
        let max_bit_rate = decoder.max_bit_rate();
        let format_bit_rate = input.bit_rate();
        let duration = (input.duration() > 0).then(|| {
            let seconds = input.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE);
            format!("{seconds:.6}")
        });

        Ok(EncodingParameters {
            profile: Some(format!("{:?}", decoder.profile())),
            level: None,
            refs: Some(decoder.references().to_string()),
            has_b_frames: Some(decoder.has_b_frames().to_string()),
            bit_rate: (bit_rate > 0).then(|| bit_rate.to_string()),
            max_bit_rate: (max_bit_rate > 0).then(|| max_bit_rate.to_string()),
            bits_per_raw_sample: None,
            format_bit_rate: (format_bit_rate > 0).then(|| format_bit_rate.to_string()),
            duration,
        })
    }
}
