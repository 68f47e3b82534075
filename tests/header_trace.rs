//! Header trace parsing integration tests.

use nalscope::parse_header_trace;
use nalscope::trace::MAX_SLICE_HEADERS;

fn slice(first_mb: u32) -> String {
    format!(
        "[trace_headers @ 0x55] Slice Header\n\
         [trace_headers @ 0x55] 0           first_mb_in_slice        1 = {first_mb}\n\
         [trace_headers @ 0x55] 1           slice_type           00111 = 7\n"
    )
}

#[test]
fn sections_collect_their_fields() {
    let text = "\
[trace_headers @ 0x55] Sequence Parameter Set
[trace_headers @ 0x55] 0           profile_idc                 01100100 = 100
[trace_headers @ 0x55] 8           constraint_set0_flag               0 = 0
[trace_headers @ 0x55] 24          level_idc                   00101000 = 40
[trace_headers @ 0x55] Picture Parameter Set
[trace_headers @ 0x55] 0           pic_parameter_set_id               1 = 0
[trace_headers @ 0x55] 1           entropy_coding_mode_flag           1 = 1
";
    let trace = parse_header_trace(text);
    assert_eq!(trace.sps.len(), 3);
    assert_eq!(trace.sps["level_idc"], "40");
    assert_eq!(trace.sps["constraint_set0_flag"], "0");
    assert_eq!(trace.pps["entropy_coding_mode_flag"], "1");
    assert!(trace.first_slice().is_none());
}

#[test]
fn slice_headers_are_capped() {
    let text: String = (0..MAX_SLICE_HEADERS as u32 + 3).map(slice).collect();
    let trace = parse_header_trace(&text);
    assert_eq!(trace.slices.len(), MAX_SLICE_HEADERS);
    assert_eq!(trace.slices[1]["first_mb_in_slice"], "1");
    assert_eq!(trace.first_slice().unwrap()["slice_type"], "7");
}

#[test]
fn unrelated_lines_are_ignored() {
    let text = "\
ffmpeg version 6.1 Copyright (c) 2000-2023 the FFmpeg developers
Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'clip.mp4':
  Duration: 00:00:10.00, start: 0.000000, bitrate: 3100 kb/s
[trace_headers @ 0x55] Sequence Parameter Set
[trace_headers @ 0x55] 0           profile_idc                 01100100 = 100
video:1kB audio:0kB subtitle:0kB other streams:0kB global headers:0kB muxing overhead: unknown
";
    let trace = parse_header_trace(text);
    assert_eq!(trace.sps.len(), 1);
    assert!(trace.pps.is_empty());
    assert!(trace.slices.is_empty());
}

#[test]
fn empty_text_gives_empty_trace() {
    let trace = parse_header_trace("");
    assert!(trace.sps.is_empty() && trace.pps.is_empty() && trace.slices.is_empty());
}
