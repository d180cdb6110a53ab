//! End-to-end monitoring over replayed traffic, using only the public API.

use std::collections::HashMap;
use std::time::Duration;

use futures::StreamExt;
use sentinel::{
    CanFrame, CanId, FrameSource, KernelTimestamp, MonitorConfig, MonitorSession, ReplaySource,
    Sentinel, SentinelError, StopReason, Verdict,
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

const START_NS: u64 = 1_700_000_000_000_000_000;

fn start() -> KernelTimestamp {
    KernelTimestamp::from_nanos(START_NS)
}

#[tokio::test]
async fn injected_frame_is_flagged_after_warmup() {
    let mut intervals = vec![0.010; 200];
    intervals.push(0.001);
    let source = ReplaySource::from_intervals(0x123, start(), intervals);

    let (records, report) = Sentinel::replay(source).unwrap().collect().await.unwrap();

    assert_eq!(records.len(), 202);
    assert_eq!(report.stop_reason, StopReason::SourceEnded);

    let (last, steady) = records.split_last().unwrap();
    assert!(steady[..10].iter().all(|r| r.verdict == Verdict::Warmup));
    assert!(steady[10..].iter().all(|r| r.verdict == Verdict::Nominal));

    assert_eq!(last.verdict, Verdict::Anomaly);
    assert!((last.residual_us() - 9_000.0).abs() < 1.0);
}

#[tokio::test]
async fn senders_are_tracked_independently() {
    let mut frames = Vec::new();
    for i in 0..30u64 {
        frames.push(CanFrame::new(0x100, &[1], KernelTimestamp::from_nanos(START_NS + i * 10_000_000)));
    }
    for i in 0..15u64 {
        frames.push(CanFrame::new(
            0x200,
            &[2],
            KernelTimestamp::from_nanos(START_NS + 5_000_000 + i * 20_000_000),
        ));
    }
    frames.sort_by_key(|frame| frame.timestamp);

    let (records, report) = Sentinel::replay(ReplaySource::new(frames)).unwrap().collect().await.unwrap();

    assert_eq!(report.identifiers, 2);
    assert_eq!(records.len(), 45);

    let mut expected: HashMap<CanId, u64> = HashMap::new();
    for record in &records {
        let next = expected.entry(record.id).or_insert(0);
        assert_eq!(record.sample_count, *next, "sample count for {}", record.id);
        *next += 1;
    }
    assert_eq!(expected[&CanId::new(0x100, false)], 30);
    assert_eq!(expected[&CanId::new(0x200, false)], 15);
}

#[tokio::test]
async fn frames_without_timestamp_are_counted_not_classified() {
    let mut frames: Vec<CanFrame> = (0..12u64)
        .map(|i| CanFrame::new(0x7, &[], KernelTimestamp::from_nanos(START_NS + i * 10_000_000)))
        .collect();
    frames.insert(3, CanFrame::new(0x7, &[], KernelTimestamp::UNAVAILABLE));
    frames.insert(8, CanFrame::new(0x8, &[], KernelTimestamp::UNAVAILABLE));

    let (records, report) = Sentinel::replay(ReplaySource::new(frames)).unwrap().collect().await.unwrap();

    assert_eq!(records.len(), 12);
    assert_eq!(report.frames_received, 14);
    assert_eq!(report.skipped_untimestamped, 2);
    assert_eq!(report.identifiers, 1);
    assert_eq!(records.last().unwrap().sample_count, 11);
}

#[tokio::test]
async fn yaml_configuration_sets_nominal_interval() {
    let config = MonitorConfig::from_yaml_str(
        "interface: vcan0\nrecord_buffer: 16\ndetector:\n  nominal_interval: 0.020\n",
    )
    .unwrap();
    let source = ReplaySource::from_intervals(0x42, start(), [0.020; 40]);

    let (records, _) = MonitorSession::replay(source, config).unwrap().collect().await.unwrap();

    assert!(records.iter().all(|r| r.residual == 0.0));
    assert!(records.iter().skip(10).all(|r| r.verdict == Verdict::Nominal));
}

#[tokio::test]
async fn consumer_can_stop_mid_stream() {
    let source = ReplaySource::from_intervals(0x1, start(), vec![0.010; 10_000]);
    let config = MonitorConfig { record_buffer: 4, ..MonitorConfig::default() };
    let mut session = MonitorSession::replay(source, config).unwrap();

    let first: Vec<_> = session.records().take(25).collect().await;
    assert_eq!(first.len(), 25);

    let report = tokio::time::timeout(Duration::from_secs(2), session.stop())
        .await
        .expect("stop should complete promptly")
        .unwrap();
    assert_eq!(report.stop_reason, StopReason::Cancelled);
    assert!(report.records_emitted >= 25);
    assert!(report.frames_received < 10_001);
}

#[tokio::test]
async fn live_setup_fails_before_monitoring_for_missing_interface() {
    let result = Sentinel::monitor(MonitorConfig::for_interface("sentinel-none0")).await;

    match result {
        Err(SentinelError::Connection { interface, .. }) => assert_eq!(interface, "sentinel-none0"),
        Err(SentinelError::UnsupportedPlatform { .. }) => {}
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("monitoring a missing interface should fail"),
    }
}

#[tokio::test]
async fn invalid_detector_parameters_are_rejected_at_setup() {
    let mut config = MonitorConfig::default();
    config.detector.measurement_noise = 0.0;

    let result = MonitorSession::replay(ReplaySource::new(Vec::new()), config);
    assert!(matches!(result, Err(SentinelError::Config { .. })));
}

/// Source fed frame by frame from the test, like a quiet live bus
struct ChannelSource {
    frames: ReceiverStream<CanFrame>,
}

#[async_trait::async_trait]
impl FrameSource for ChannelSource {
    async fn next_frame(&mut self) -> sentinel::Result<Option<CanFrame>> {
        Ok(self.frames.next().await)
    }

    fn name(&self) -> &str {
        "channel"
    }
}

#[tokio::test]
async fn records_arrive_as_frames_arrive() {
    let (tx, rx) = mpsc::channel(8);
    let source = ChannelSource { frames: ReceiverStream::new(rx) };
    let mut session = MonitorSession::with_source(source, MonitorConfig::default()).unwrap();
    assert_eq!(session.source_name(), "channel");

    for i in 0..3u64 {
        let frame = CanFrame::new(0x10, &[], KernelTimestamp::from_nanos(START_NS + i * 10_000_000));
        tx.send(frame).await.unwrap();

        let record = tokio::time::timeout(Duration::from_secs(1), session.next_record())
            .await
            .expect("record should follow its frame")
            .unwrap();
        assert_eq!(record.sample_count, i);
    }

    drop(tx);
    assert!(session.next_record().await.is_none());
    let report = session.stop().await.unwrap();
    assert_eq!(report.stop_reason, StopReason::SourceEnded);
    assert_eq!(report.records_emitted, 3);
}
