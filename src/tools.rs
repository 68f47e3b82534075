//! [`MediaSource`] implementation backed by the `ffprobe` and `ffmpeg`
//! executables.
//!
//! Every acquisition is a single blocking child process. Output is captured
//! in memory; `ffprobe` output is decoded from its JSON writer with serde.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use nalscope::{FfmpegTools, MediaSource};
//!
//! let tools = FfmpegTools::from_env();
//! let frames = tools.acquire_frame_metadata(Path::new("input.mp4"))?;
//! println!("{} frames", frames.len());
//! # Ok::<(), nalscope::AcquisitionError>(())
//! ```

use std::collections::HashMap;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::config::ToolPaths;
use crate::error::AcquisitionError;
use crate::frame::{FrameRecord, PictureType};
use crate::parameters::EncodingParameters;
use crate::source::MediaSource;

const FFPROBE: &str = "ffprobe";
const FFMPEG: &str = "ffmpeg";

const FRAME_ENTRIES: &str = "frame=pict_type,pts,pkt_size:packet=size,pts";
const PARAMETER_ENTRIES: &str = "stream=profile,level,refs,has_b_frames,bit_rate,max_bit_rate,\
bits_per_raw_sample:format=bit_rate,duration";

/// Runs the FFmpeg command-line tools to acquire analysis inputs.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTools {
    paths: ToolPaths,
}

impl FfmpegTools {
    /// Use the given executable locations.
    pub fn new(paths: ToolPaths) -> Self {
        Self { paths }
    }

    /// Resolve executables from the environment (see [`ToolPaths::from_env`]).
    pub fn from_env() -> Self {
        Self::new(ToolPaths::from_env())
    }

    /// The executable locations in use.
    pub fn paths(&self) -> &ToolPaths {
        &self.paths
    }

    fn run_ffprobe(&self, entries: &str, path: &Path) -> Result<Output, AcquisitionError> {
        let args: [&OsStr; 9] = [
            "-v".as_ref(),
            "quiet".as_ref(),
            "-print_format".as_ref(),
            "json".as_ref(),
            "-select_streams".as_ref(),
            "v:0".as_ref(),
            "-show_entries".as_ref(),
            entries.as_ref(),
            path.as_os_str(),
        ];
        run(FFPROBE, &self.paths.ffprobe, &args)
    }
}

impl MediaSource for FfmpegTools {
    fn acquire_frame_metadata(&self, path: &Path) -> Result<Vec<FrameRecord>, AcquisitionError> {
        log::debug!("Probing frame metadata of {}", path.display());
        let output = self.run_ffprobe(FRAME_ENTRIES, path)?;
        let frames = parse_frame_metadata(&output.stdout)?;
        log::debug!("{} reported {} frames", FFPROBE, frames.len());
        Ok(frames)
    }

    fn acquire_elementary_stream(&self, path: &Path) -> Result<Vec<u8>, AcquisitionError> {
        log::debug!("Extracting elementary stream of {}", path.display());
        let args: [&OsStr; 10] = [
            "-v".as_ref(),
            "error".as_ref(),
            "-i".as_ref(),
            path.as_os_str(),
            "-c:v".as_ref(),
            "copy".as_ref(),
            "-an".as_ref(),
            "-f".as_ref(),
            "h264".as_ref(),
            "-".as_ref(),
        ];
        let output = run(FFMPEG, &self.paths.ffmpeg, &args)?;
        log::debug!("Extracted {} stream bytes", output.stdout.len());
        Ok(output.stdout)
    }

    fn acquire_header_trace(&self, path: &Path) -> Result<String, AcquisitionError> {
        log::debug!("Tracing headers of {}", path.display());
        let args: [&OsStr; 9] = [
            "-i".as_ref(),
            path.as_os_str(),
            "-c:v".as_ref(),
            "copy".as_ref(),
            "-bsf:v".as_ref(),
            "trace_headers".as_ref(),
            "-f".as_ref(),
            "null".as_ref(),
            "-".as_ref(),
        ];
        let output = run(FFMPEG, &self.paths.ffmpeg, &args)?;
        Ok(String::from_utf8_lossy(&output.stderr).into_owned())
    }

    fn acquire_encoding_parameters(
        &self,
        path: &Path,
    ) -> Result<EncodingParameters, AcquisitionError> {
        log::debug!("Probing encoding parameters of {}", path.display());
        let output = self.run_ffprobe(PARAMETER_ENTRIES, path)?;
        parse_encoding_parameters(&output.stdout)
    }
}

/// Run `program` to completion, capturing stdout and stderr.
fn run(tool: &'static str, program: &Path, args: &[&OsStr]) -> Result<Output, AcquisitionError> {
    log::trace!("Running {} {:?}", program.display(), args);
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|error| match error.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => AcquisitionError::ToolNotFound {
                tool,
                path: program.to_path_buf(),
                reason: error.to_string(),
            },
            _ => AcquisitionError::Io(error),
        })?;

    if !output.status.success() {
        return Err(AcquisitionError::ToolFailed {
            tool,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

#[derive(Debug, Default, Deserialize)]
struct FrameProbe {
    #[serde(default)]
    frames: Vec<ProbedFrame>,
    #[serde(default)]
    packets: Vec<ProbedPacket>,
}

#[derive(Debug, Deserialize)]
struct ProbedFrame {
    #[serde(default)]
    pict_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pts: Option<i64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pkt_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ProbedPacket {
    #[serde(default, deserialize_with = "lenient_u64")]
    size: Option<u64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pts: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct ParameterProbe {
    #[serde(default)]
    streams: Vec<ProbedStream>,
    #[serde(default)]
    format: Option<ProbedFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbedStream {
    #[serde(default, deserialize_with = "lenient_string")]
    profile: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    level: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    refs: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    has_b_frames: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    bit_rate: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    max_bit_rate: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    bits_per_raw_sample: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbedFormat {
    #[serde(default, deserialize_with = "lenient_string")]
    bit_rate: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    duration: Option<String>,
}

/// Decode `ffprobe` frame and packet entries into frame records.
///
/// Frames are listed in output order and packets in decode order. A frame
/// without `pkt_size` takes the size of the packet with the same `pts`,
/// then the packet at the same position, then 0.
pub(crate) fn parse_frame_metadata(json: &[u8]) -> Result<Vec<FrameRecord>, AcquisitionError> {
    let probe: FrameProbe = serde_json::from_slice(json)?;
    let sizes_by_pts: HashMap<i64, u64> = probe
        .packets
        .iter()
        .filter_map(|packet| Some((packet.pts?, packet.size?)))
        .collect();

    let frames = probe
        .frames
        .into_iter()
        .enumerate()
        .map(|(index, frame)| {
            let packet_size = frame
                .pkt_size
                .or_else(|| frame.pts.and_then(|pts| sizes_by_pts.get(&pts).copied()))
                .or_else(|| probe.packets.get(index).and_then(|packet| packet.size))
                .unwrap_or(0);
            let pict_type = frame
                .pict_type
                .as_deref()
                .and_then(|label| label.parse().ok())
                .unwrap_or(PictureType::Unknown);

            FrameRecord {
                index: index as u64,
                pict_type,
                presentation_timestamp: frame.pts,
                packet_size,
            }
        })
        .collect();

    Ok(frames)
}

/// Decode `ffprobe` stream and format entries.
pub(crate) fn parse_encoding_parameters(
    json: &[u8],
) -> Result<EncodingParameters, AcquisitionError> {
    let probe: ParameterProbe = serde_json::from_slice(json)?;
    let stream = probe
        .streams
        .into_iter()
        .next()
        .ok_or(AcquisitionError::NoVideoStream)?;
    let format = probe.format.unwrap_or_default();

    Ok(EncodingParameters {
        profile: stream.profile,
        level: stream.level,
        refs: stream.refs,
        has_b_frames: stream.has_b_frames,
        bit_rate: stream.bit_rate,
        max_bit_rate: stream.max_bit_rate,
        bits_per_raw_sample: stream.bits_per_raw_sample,
        format_bit_rate: format.bit_rate,
        duration: format.duration,
    })
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_u64(),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_i64(),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    })
}
