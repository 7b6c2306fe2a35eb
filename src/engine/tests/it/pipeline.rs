use crate::helper::*;
use chrono::{Duration, Utc};
use engine::Error;
use trawlwatch_core::{CheckpointStore, TaskName};

#[tokio::test]
async fn test_stage_in_flight_is_not_run_again() {
    test(|helper| async move {
        let vessel = helper
            .vessel(1)
            .at(0, 47.0, -4.0)
            .at(600, 47.05, -4.0)
            .build();
        helper
            .store
            .set_in_flight(TaskName::IngestAndSegment, Utc::now());

        let err = helper.pipeline(None).run().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Stage {
                task_name: TaskName::IngestAndSegment,
                num_succeeded: 0,
                ..
            }
        ));
        assert!(matches!(
            err.core(),
            Some(trawlwatch_core::Error::TaskInFlight { .. })
        ));
        assert!(helper.store.segments(vessel).is_empty());
    })
    .await;
}

#[tokio::test]
async fn test_stale_in_flight_marker_is_taken_over() {
    test(|helper| async move {
        let vessel = helper
            .vessel(1)
            .at(0, 47.0, -4.0)
            .at(600, 47.05, -4.0)
            .build();
        helper
            .store
            .set_in_flight(TaskName::IngestAndSegment, Utc::now() - Duration::hours(2));

        helper.run().await;

        assert_eq!(helper.store.segments(vessel).len(), 1);

        let execution = helper
            .store
            .task_execution(TaskName::IngestAndSegment)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(execution.in_flight_since, None);
        assert_eq!(execution.position_count, 2);
    })
    .await;
}

#[tokio::test]
async fn test_single_stage_run_only_runs_that_stage() {
    test(|helper| async move {
        let vessel = helper
            .vessel(1)
            .at(0, 47.0, -4.0)
            .at(600, 47.05, -4.0)
            .build();

        let report = helper
            .pipeline(Some(TaskName::IngestAndSegment))
            .run()
            .await
            .unwrap();

        assert!(report.segmentation.is_some());
        assert!(report.aggregation.is_none());
        assert!(helper.store.segments(vessel).iter().all(|s| !s.zones_matched));
        assert_eq!(
            helper.watermark(TaskName::ClassifyAndAggregate).await,
            TaskName::initial_watermark()
        );

        let report = helper
            .pipeline(Some(TaskName::ClassifyAndAggregate))
            .run()
            .await
            .unwrap();

        assert!(report.segmentation.is_none());
        assert_eq!(report.aggregation.unwrap().num_segments, 1);
        assert!(helper.store.segments(vessel).iter().all(|s| s.zones_matched));
    })
    .await;
}

#[tokio::test]
async fn test_both_stages_release_their_markers() {
    test(|helper| async move {
        helper
            .vessel(1)
            .at(0, 47.0, -4.0)
            .at(600, 47.05, -4.0)
            .build();

        helper.run().await;

        for task_name in [TaskName::IngestAndSegment, TaskName::ClassifyAndAggregate] {
            let execution = helper
                .store
                .task_execution(task_name)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(execution.in_flight_since, None);
            assert!(execution.point_in_time > TaskName::initial_watermark());
        }
    })
    .await;
}
