//! GOP segmentation and statistics integration tests.

use nalscope::frame::frames_from_pattern;
use nalscope::statistics::{frame_bitrate, population_std_dev};
use nalscope::{
    BitrateStatistics, FrameRecord, FrameSizeStatistics, GopIterator, GopStatistics, PictureType,
    gop,
};

fn sized(pattern: &str, sizes: &[u64]) -> Vec<FrameRecord> {
    let mut frames = frames_from_pattern(pattern);
    for (frame, size) in frames.iter_mut().zip(sizes) {
        frame.packet_size = *size;
    }
    frames
}

#[test]
fn gops_open_at_each_i_frame() {
    let frames = frames_from_pattern("IPPPIPPIPPPPP");
    let sizes: Vec<usize> = gop::segment(&frames).iter().map(|gop| gop.len()).collect();
    assert_eq!(sizes, [4, 3, 6]);
}

#[test]
fn two_gops_from_five_frames() {
    let frames = frames_from_pattern("IPPIP");
    let sizes: Vec<usize> = gop::segment(&frames).iter().map(|gop| gop.len()).collect();
    assert_eq!(sizes, [3, 2]);
}

#[test]
fn gops_partition_the_input() {
    let frames = frames_from_pattern("BPIBBPIPBI");
    let gops = gop::segment(&frames);
    let total: usize = gops.iter().map(|gop| gop.len()).sum();
    assert_eq!(total, frames.len());
    assert!(!gops[0].starts_with_keyframe());
    assert!(gops[1..].iter().all(|gop| gop.starts_with_keyframe()));
}

#[test]
fn no_i_frames_is_one_open_gop() {
    let frames = frames_from_pattern("PPBP");
    let gops: Vec<_> = GopIterator::new(&frames).collect();
    assert_eq!(gops.len(), 1);
    assert_eq!(gops[0].picture_types().len(), 4);
    assert_eq!(gops[0].keyframe_count(), 0);
}

#[test]
fn gop_statistics_in_frames_and_seconds() {
    let frames = frames_from_pattern("IPPPIPPIPPPPP");
    let stats = GopStatistics::compute(&gop::segment(&frames), 30.0);

    assert_eq!(stats.count, 3);
    assert_eq!(stats.sizes, [4, 3, 6]);
    assert_eq!((stats.min, stats.max), (3, 6));
    assert!((stats.mean - 13.0 / 3.0).abs() < 1e-9);
    assert!((stats.max_seconds - 0.2).abs() < 1e-9);
    assert_eq!(stats.keyframe_count, 3);
}

#[test]
fn empty_gop_statistics_are_zero() {
    let stats = GopStatistics::compute(&[], 60.0);
    assert_eq!(stats.count, 0);
    assert_eq!(stats.mean, 0.0);
    assert_eq!(stats.min, 0);
}

#[test]
fn average_bitrate_of_uniform_frames() {
    let stats = BitrateStatistics::compute(&[1000; 60], 60.0, 5);
    assert_eq!(stats.total_bits, 480_000);
    assert!((stats.duration_seconds - 1.0).abs() < 1e-9);
    assert!((stats.average_bitrate - 480_000.0).abs() < 1e-6);
    assert!((stats.peak_frame_bitrate - 480_000.0).abs() < 1e-6);
    assert_eq!(stats.frame_sizes.as_ref().unwrap().std_dev, 0.0);
}

#[test]
fn average_bitrate_of_four_frames_at_sixty_fps() {
    let stats = BitrateStatistics::compute(&[1000, 1000, 1000, 1000], 60.0, 5);
    assert!((stats.average_bitrate - 480_000.0).abs() < 1e-6);
}

#[test]
fn empty_bitrate_statistics_are_zero() {
    let stats = BitrateStatistics::compute(&[], 60.0, 5);
    assert_eq!(stats.frame_count, 0);
    assert_eq!(stats.average_bitrate, 0.0);
    assert_eq!(stats.peak_frame_bitrate, 0.0);
    assert!(stats.frame_sizes.is_none());
    assert!(stats.largest_frames.is_empty());
}

#[test]
fn largest_frames_rank_is_stable() {
    let stats = BitrateStatistics::compute(&[10, 50, 30, 50, 20, 50], 25.0, 4);
    let ranked: Vec<(usize, u64)> = stats
        .largest_frames
        .iter()
        .map(|frame| (frame.index, frame.size))
        .collect();
    assert_eq!(ranked, [(1, 50), (3, 50), (5, 50), (2, 30)]);
    assert_eq!(stats.largest_frames[0].bitrate, frame_bitrate(50, 25.0));
    assert_eq!(stats.min_frame_bitrate, frame_bitrate(10, 25.0));
}

#[test]
fn std_dev_uses_population_formula() {
    let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
    assert!((population_std_dev(&values) - 2.0).abs() < 1e-12);
    assert_eq!(population_std_dev(&[]), 0.0);
}

#[test]
fn frame_size_statistics_split_i_and_p() {
    let frames = sized("IPBPIP", &[9000, 1000, 400, 3000, 11000, 2000]);
    let stats = FrameSizeStatistics::compute(&frames);

    let i_frames = stats.i_frames.as_ref().unwrap();
    assert_eq!(i_frames.count, 2);
    assert_eq!(i_frames.mean, 10_000.0);
    assert_eq!(i_frames.std_dev, 1000.0);

    let p_frames = stats.p_frames.as_ref().unwrap();
    assert_eq!(p_frames.count, 3);
    assert_eq!(p_frames.mean, 2000.0);
    assert!(stats.size_cv > 0.0);
}

#[test]
fn frame_size_statistics_without_p_frames() {
    let frames = vec![FrameRecord::new(0, PictureType::I, 500)];
    let stats = FrameSizeStatistics::compute(&frames);
    assert!(stats.p_frames.is_none());
    assert_eq!(stats.size_cv, 0.0);
}
