//! NAL classification and reference-frame analysis integration tests.

use nalscope::{
    NalRole, ParameterSetKind, ReferenceFrameAnalysis, ReferencePolicy, SliceType, classify,
    classify_with_policy, nal,
};

fn annex_b(units: &[&[u8]]) -> Vec<u8> {
    let mut stream = Vec::new();
    for unit in units {
        stream.extend_from_slice(&[0x00, 0x00, 0x00, 0x01]);
        stream.extend_from_slice(unit);
    }
    stream
}

#[test]
fn roles_follow_nal_type() {
    let stream = annex_b(&[
        &[0x67, 0x42],
        &[0x68, 0xce],
        &[0x06, 0x05],
        &[0x65, 0x88],
        &[0x41, 0x9a],
        &[0x09, 0xf0],
    ]);
    let roles: Vec<NalRole> = nal::scan(&stream).map(|unit| classify(&unit)).collect();

    assert_eq!(roles[0], NalRole::ParameterSet(ParameterSetKind::Sps));
    assert_eq!(roles[1], NalRole::ParameterSet(ParameterSetKind::Pps));
    assert_eq!(roles[2], NalRole::Other);
    assert_eq!(roles[5], NalRole::Other);

    let idr = roles[3].as_slice().copied().unwrap();
    assert!(idr.is_idr && idr.is_reference);
    assert_eq!(idr.slice_type, SliceType::I);

    let non_idr = roles[4].as_slice().copied().unwrap();
    assert!(!non_idr.is_idr && non_idr.is_reference);
    assert_eq!(non_idr.slice_type, SliceType::PorB);
}

#[test]
fn every_slice_type_has_fixed_referenceability() {
    let expected = [(1, true), (2, true), (3, false), (4, false), (5, true)];
    for (nal_type, is_reference) in expected {
        let stream = annex_b(&[&[nal_type, 0x00]]);
        let unit = nal::scan(&stream).next().unwrap();
        let slice = classify(&unit).as_slice().copied().unwrap();
        assert_eq!(slice.is_reference, is_reference, "type {nal_type}");
        assert_eq!(slice.is_idr, nal_type == 5, "type {nal_type}");
    }
}

#[test]
fn ref_idc_policy_reads_header_bits() {
    let stream = annex_b(&[&[0x01, 0x00], &[0x63, 0x00]]);
    let slices: Vec<_> = nal::scan(&stream)
        .map(|unit| {
            classify_with_policy(&unit, ReferencePolicy::RefIdc)
                .as_slice()
                .copied()
                .unwrap()
        })
        .collect();
    assert!(!slices[0].is_reference);
    assert!(slices[1].is_reference);
}

#[test]
fn reference_ratio_over_mixed_slices() {
    // ref, ref, non-ref, ref
    let stream = annex_b(&[
        &[0x67, 0x42],
        &[0x68, 0xce],
        &[0x65, 0x88, 0x84, 0x00],
        &[0x41, 0x9a],
        &[0x03, 0x00],
        &[0x41, 0x9a],
    ]);
    let report = ReferenceFrameAnalysis::from_stream(&stream, ReferencePolicy::NalType).report();

    assert!(report.has_parameter_sets());
    assert_eq!(report.total_slices, 4);
    assert_eq!(report.idr_count, 1);
    assert_eq!(report.non_idr_reference_count, 2);
    assert_eq!(report.non_reference_count, 1);
    assert_eq!(report.reference_ratio, 75.0);
    assert_eq!(report.idr_sizes.as_ref().unwrap().max, 4);
    assert_eq!(report.reference_sizes.as_ref().unwrap().mean, 2.0);
}

#[test]
fn stream_without_slices_has_zero_ratio() {
    let stream = annex_b(&[&[0x06, 0x05], &[0x09, 0xf0]]);
    let analysis = ReferenceFrameAnalysis::from_stream(&stream, ReferencePolicy::NalType);
    assert_eq!(analysis.unit_count, 2);
    assert_eq!(analysis.other_count, 2);

    let report = analysis.report();
    assert_eq!(report.reference_ratio, 0.0);
    assert!(!report.has_sps && !report.has_pps);
}
