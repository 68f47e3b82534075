//! Annex-B scanner integration tests.

use nalscope::nal::{self, NAL_TYPE_COUNT, StartCode};
use nalscope::NalUnitType;

#[test]
fn mixed_start_codes_and_alignment() {
    let stream = [
        0x00, 0x00, 0x00, 0x01, 0x67, 0x64, // SPS, 4-byte start code
        0x00, 0x00, 0x01, 0x68, 0xee, // PPS, 3-byte start code
        0x00, 0x00, 0x01, 0x65, 0x88, 0x84, // IDR
    ];
    let units: Vec<_> = nal::scan(&stream).collect();

    assert_eq!(units.len(), 3);
    assert_eq!(units[0].nal_type, 7);
    assert_eq!(units[0].offset, 4);
    assert_eq!(units[0].start_code, StartCode::Long);
    assert_eq!(units[1].nal_type, 8);
    assert_eq!(units[1].offset, 9);
    assert_eq!(units[1].start_code, StartCode::Short);
    assert_eq!(units[2].unit_type(), NalUnitType::SliceIdr);
    assert_eq!(units[2].payload, &[0x65, 0x88, 0x84]);
}

#[test]
fn leading_garbage_is_ignored() {
    let stream = [0xff, 0x12, 0x00, 0x00, 0x01, 0x41, 0x9a];
    let units: Vec<_> = nal::scan(&stream).collect();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].nal_type, 1);
    assert_eq!(units[0].offset, 5);
}

#[test]
fn no_start_code_yields_nothing() {
    assert_eq!(nal::scan(&[]).count(), 0);
    assert_eq!(nal::scan(&[0x65, 0x88, 0x00, 0x00]).count(), 0);
}

#[test]
fn empty_units_are_skipped() {
    let stream = [0x00, 0x00, 0x01, 0x00, 0x00, 0x01, 0x41, 0x00, 0x00, 0x01];
    let units: Vec<_> = nal::scan(&stream).collect();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].payload, &[0x41]);
}

#[test]
fn trailing_bytes_form_final_unit() {
    let stream = [0x00, 0x00, 0x01, 0x09, 0xf0, 0x00, 0x00, 0x01, 0x01, 0x02, 0x03];
    let last = nal::scan(&stream).last().unwrap();
    assert_eq!(last.nal_type, 1);
    assert_eq!(last.length, 3);
}

#[test]
fn ref_idc_is_read_from_header() {
    let stream = [0x00, 0x00, 0x01, 0x61, 0x00, 0x00, 0x01, 0x01];
    let ref_idcs: Vec<u8> = nal::scan(&stream).map(|unit| unit.ref_idc()).collect();
    assert_eq!(ref_idcs, [3, 0]);
}

#[test]
fn histogram_counts_each_type() {
    let stream = [
        0x00, 0x00, 0x01, 0x67, 0x00, 0x00, 0x01, 0x68, 0x00, 0x00, 0x01, 0x65, 0x00, 0x00, 0x01,
        0x41, 0x00, 0x00, 0x01, 0x41,
    ];
    let histogram = nal::type_histogram(&stream);
    assert_eq!(histogram.len(), NAL_TYPE_COUNT);
    assert_eq!(histogram[1], 2);
    assert_eq!(histogram[5], 1);
    assert_eq!(histogram[7], 1);
    assert_eq!(histogram[8], 1);
    assert_eq!(histogram.iter().sum::<u64>(), 5);
}

#[test]
fn scanning_is_restartable() {
    let stream = [0x00, 0x00, 0x01, 0x67, 0x00, 0x00, 0x01, 0x65];
    let first: Vec<u8> = nal::scan(&stream).map(|unit| unit.nal_type).collect();
    let second: Vec<u8> = nal::scan(&stream).map(|unit| unit.nal_type).collect();
    assert_eq!(first, second);
}

#[test]
fn units_reassemble_the_stream_from_the_first_start_code() {
    let stream = [
        0x12, 0x34, 0x00, 0x00, 0x01, 0x67, 0x42, 0x00, 0x1f, 0x00, 0x00, 0x00, 0x01, 0x68, 0xce,
        0x00, 0x00, 0x01, 0x65, 0x88, 0x84, 0x21,
    ];
    let units: Vec<_> = nal::scan(&stream).collect();
    let first = units[0].start_code_offset();

    let mut rebuilt = Vec::new();
    for unit in &units {
        rebuilt.extend_from_slice(&stream[unit.start_code_offset()..unit.offset]);
        rebuilt.extend_from_slice(unit.payload);
    }
    assert_eq!(first, 2);
    assert_eq!(rebuilt, &stream[first..]);
}
