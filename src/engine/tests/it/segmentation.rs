use crate::helper::*;
use chrono::{Duration, Utc};
use trawlwatch_core::{
    Arrival, CheckpointAdvance, Departure, ExcursionArrival, ExcursionId, ExcursionRef,
    NewExcursion, NewSegment, Point, PortId, Segment, SegmentType, SegmentationBatch,
    SegmentationInbound, TaskName, VesselId, VesselSegmentation,
};

fn assert_contiguous(segments: &[Segment]) {
    for pair in segments.windows(2) {
        assert_eq!(pair[0].timestamp_end, pair[1].timestamp_start);
        assert_eq!(pair[0].end_position, pair[1].start_position);
    }
    assert!(segments.iter().all(|s| s.duration > Duration::zero()));
    assert_eq!(segments.iter().filter(|s| s.last_vessel_segment).count(), 1);
    assert!(segments.last().unwrap().last_vessel_segment);
}

#[tokio::test]
async fn test_new_vessel_with_single_position_gets_bootstrap_segment() {
    test(|helper| async move {
        let vessel = helper.vessel(1).at(0, 47.0, -4.0).build();

        let report = helper.run_segmentation().await;

        let segments = helper.store.segments(vessel);
        assert_eq!(report.num_segments, 1);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].duration, Duration::seconds(1));
        assert_eq!(segments[0].timestamp_end, t0());
        assert!(segments[0].last_vessel_segment);

        let excursions = helper.store.excursions(vessel);
        assert_eq!(excursions.len(), 1);
        assert!(excursions[0].is_open());
        assert_eq!(excursions[0].departure.port_id, None);
        assert_eq!(excursions[0].departure.timestamp, None);
    })
    .await;
}

#[tokio::test]
async fn test_segments_stay_contiguous_across_runs() {
    test(|helper| async move {
        let vessel = helper
            .vessel(1)
            .at(0, 47.0, -4.0)
            .at(600, 47.05, -4.0)
            .at(1200, 47.1, -4.0)
            .build();

        helper.run().await;
        assert_eq!(helper.store.segments(vessel).len(), 2);

        helper
            .vessel(1)
            .at(1800, 47.15, -4.0)
            .at(2400, 47.2, -4.0)
            .build();

        let report = helper.run().await;
        assert_eq!(report.segmentation.unwrap().num_segments, 2);

        let segments = helper.store.segments(vessel);
        assert_eq!(segments.len(), 4);
        assert_contiguous(&segments);
        assert!(
            segments
                .iter()
                .all(|s| s.excursion_id == segments[0].excursion_id)
        );
        assert_eq!(helper.store.excursions(vessel).len(), 1);
    })
    .await;
}

#[tokio::test]
async fn test_late_positions_are_discarded() {
    test(|helper| async move {
        let vessel = helper
            .vessel(1)
            .at(0, 47.0, -4.0)
            .at(600, 47.05, -4.0)
            .at(1200, 47.1, -4.0)
            .build();

        helper.run_segmentation().await;

        helper
            .vessel(1)
            .at(300, 47.02, -4.0)
            .at(1800, 47.15, -4.0)
            .build();

        let report = helper.run_segmentation().await;
        assert_eq!(report.num_discarded, 1);
        assert_eq!(report.num_segments, 1);

        let segments = helper.store.segments(vessel);
        assert_eq!(segments.len(), 3);
        assert_contiguous(&segments);
        assert_eq!(segments[2].timestamp_start, t0() + Duration::seconds(1200));
    })
    .await;
}

#[tokio::test]
async fn test_failing_vessel_does_not_block_other_vessels() {
    test(|helper| async move {
        let healthy = helper
            .vessel(1)
            .at(0, 47.0, -4.0)
            .at(600, 47.05, -4.0)
            .at(1200, 47.1, -4.0)
            .build();
        let failing = helper
            .vessel(2)
            .at(0, 46.0, -4.0)
            .at(600, 46.05, -4.0)
            .build();

        helper.store.fail_vessel(failing);

        let report = helper.run_segmentation().await;
        assert_eq!(report.num_failed, 1);
        assert_eq!(report.num_vessels, 1);
        assert_eq!(helper.store.segments(healthy).len(), 2);
        assert!(helper.store.segments(failing).is_empty());

        let watermark = helper.watermark(TaskName::IngestAndSegment).await;
        assert_eq!(report.watermark, Some(watermark));
        assert!(watermark > TaskName::initial_watermark());
        assert_eq!(
            helper.store.retries().get(&failing),
            Some(&TaskName::initial_watermark())
        );

        helper.store.heal_vessel(failing);

        let report = helper.run_segmentation().await;
        assert_eq!(report.num_failed, 0);
        assert_eq!(report.num_resumed, 1);
        assert_eq!(helper.store.segments(healthy).len(), 2);
        assert_eq!(helper.store.segments(failing).len(), 1);
        assert!(helper.store.retries().is_empty());
    })
    .await;
}

#[tokio::test]
async fn test_failing_vessel_does_not_hold_back_capped_windows() {
    let mut settings = test_settings();
    settings.batch_window = std::time::Duration::from_secs(24 * 3600);

    test_with_settings(settings, |helper| async move {
        let epoch = TaskName::initial_watermark();

        let healthy = helper
            .vessel(1)
            .created_at(epoch + Duration::hours(1))
            .at(0, 47.0, -4.0)
            .at(600, 47.05, -4.0)
            .build();
        let failing = helper
            .vessel(2)
            .created_at(epoch + Duration::hours(1))
            .at(0, 46.0, -4.0)
            .at(600, 46.05, -4.0)
            .build();
        helper
            .vessel(1)
            .created_at(epoch + Duration::days(2))
            .at(1200, 47.1, -4.0)
            .build();

        helper.store.fail_vessel(failing);

        for _ in 0..5 {
            helper.run_segmentation().await;
        }

        assert_eq!(helper.store.segments(healthy).len(), 2);
        assert!(helper.store.segments(failing).is_empty());
        assert!(
            helper.watermark(TaskName::IngestAndSegment).await >= epoch + Duration::days(2)
        );
        assert_eq!(helper.store.retries().get(&failing), Some(&epoch));

        helper.store.heal_vessel(failing);
        let report = helper.run_segmentation().await;

        assert_eq!(report.num_failed, 0);
        assert_eq!(helper.store.segments(failing).len(), 1);
        assert!(helper.store.retries().is_empty());
    })
    .await;
}

#[tokio::test]
async fn test_watermark_advances_to_latest_ingested_position() {
    test(|helper| async move {
        helper
            .vessel(1)
            .at(0, 47.0, -4.0)
            .at(600, 47.05, -4.0)
            .build();

        let report = helper.run_segmentation().await;

        let watermark = helper.watermark(TaskName::IngestAndSegment).await;
        assert_eq!(report.watermark, Some(watermark));
        assert!(watermark > TaskName::initial_watermark());

        let report = helper.run_segmentation().await;
        assert_eq!(report.num_vessels, 0);
        assert_eq!(report.watermark, None);
    })
    .await;
}

#[tokio::test]
async fn test_capped_window_without_positions_advances_watermark() {
    let mut settings = test_settings();
    settings.batch_window = std::time::Duration::from_secs(3600);

    test_with_settings(settings, |helper| async move {
        let report = helper.run_segmentation().await;

        let expected = TaskName::initial_watermark() + Duration::hours(1);
        assert_eq!(report.watermark, Some(expected));
        assert_eq!(
            helper.watermark(TaskName::IngestAndSegment).await,
            expected
        );
    })
    .await;
}

#[tokio::test]
async fn test_port_lookup_is_retried_on_timeout() {
    test(|helper| async move {
        let vessel = helper
            .vessel(1)
            .at(0, 47.0, -4.0)
            .at(600, 47.0, -4.0)
            .build();

        helper.store.time_out_port_lookups(2);

        let report = helper.run_segmentation().await;
        assert_eq!(report.num_failed, 0);
        assert_eq!(helper.store.num_port_lookups(), 3);

        let segments = helper.store.segments(vessel);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].segment_type, SegmentType::AtSea);
    })
    .await;
}

#[tokio::test]
async fn test_reporting_gap_becomes_default_ais_segment() {
    test(|helper| async move {
        let vessel: VesselId = helper
            .vessel(1)
            .at(0, 47.0, -4.0)
            .at(600, 47.05, -4.0)
            .at(4200, 47.3, -4.0)
            .build();

        helper.run_segmentation().await;

        let segments = helper.store.segments(vessel);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].segment_type, SegmentType::AtSea);
        assert_eq!(segments[1].segment_type, SegmentType::DefaultAis);
        assert_eq!(segments[1].duration, Duration::seconds(3600));
    })
    .await;
}

#[tokio::test]
async fn test_rejected_commit_writes_nothing() {
    test(|helper| async move {
        let first = helper.vessel(1).build();
        let second = helper.vessel(2).build();

        let mut opened = VesselSegmentation::new(first);
        opened.new_excursions.push(NewExcursion {
            vessel_id: first,
            departure: Departure::default(),
            arrival: None,
        });
        opened.segments.push(NewSegment {
            vessel_id: first,
            excursion: ExcursionRef::New(0),
            timestamp_start: t0(),
            timestamp_end: t0() + Duration::seconds(600),
            start_position: Point::new(47.0, -4.0),
            end_position: Point::new(47.05, -4.0),
            distance: 3.0,
            duration: Duration::seconds(600),
            average_speed: 18.0,
            segment_type: SegmentType::AtSea,
            last_vessel_segment: true,
        });

        let mut closing = VesselSegmentation::new(second);
        closing.closed_excursions.push(ExcursionArrival {
            excursion_id: ExcursionId::new(99),
            arrival: Arrival {
                port_id: PortId::new(1),
                timestamp: t0(),
                position: Point::new(46.0, -4.0),
            },
        });

        let batch = SegmentationBatch {
            vessels: vec![opened, closing],
            retries: vec![],
        };
        let checkpoint = CheckpointAdvance {
            task_name: TaskName::IngestAndSegment,
            point_in_time: Utc::now(),
            duration: None,
            position_count: 2,
        };

        let err = helper
            .store
            .commit_segmentation(batch, Some(checkpoint))
            .await
            .unwrap_err();

        assert!(err.is_inconsistency());
        assert!(helper.store.segments(first).is_empty());
        assert!(helper.store.excursions(first).is_empty());
        assert_eq!(
            helper.watermark(TaskName::IngestAndSegment).await,
            TaskName::initial_watermark()
        );
    })
    .await;
}
