use crate::helper::*;
use chrono::{Duration, Utc};
use engine::load_vessel_history;
use trawlwatch_core::{
    Departure, Excursion, ExcursionId, ExcursionTotals, Point, Segment, SegmentId, SegmentType,
    VesselId,
};

static PORT_LAT: f64 = 47.2;
static PORT_LON: f64 = -4.0;

fn segment(id: i64, vessel_id: VesselId, excursion_id: ExcursionId, end_secs: i64) -> Segment {
    Segment {
        id: SegmentId::new(id),
        vessel_id,
        excursion_id,
        timestamp_start: t0() + Duration::seconds(end_secs - 600),
        timestamp_end: t0() + Duration::seconds(end_secs),
        start_position: Point::new(47.0, -4.0),
        end_position: Point::new(47.05, -4.0),
        distance: 3.0,
        duration: Duration::seconds(600),
        average_speed: 18.0,
        segment_type: SegmentType::AtSea,
        in_amp_zone: false,
        in_territorial_waters: false,
        in_zone_with_no_fishing_rights: false,
        last_vessel_segment: true,
        zones_matched: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn open_excursion(id: i64, vessel_id: VesselId) -> Excursion {
    Excursion {
        id: ExcursionId::new(id),
        vessel_id,
        departure: Departure::default(),
        arrival: None,
        totals: ExcursionTotals::default(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_port_closes_excursion_and_marks_port_activity() {
    test(|helper| async move {
        let port = helper.port(1, PORT_LAT, PORT_LON);
        let vessel = helper
            .vessel(1)
            .at(0, 47.0, -4.0)
            .at(600, 47.05, -4.0)
            .at(4000, PORT_LAT, PORT_LON)
            .build();

        helper.run_segmentation().await;

        let excursions = helper.store.excursions(vessel);
        assert_eq!(excursions.len(), 1);

        let arrival = excursions[0].arrival.clone().unwrap();
        assert_eq!(arrival.port_id, port);
        assert_eq!(arrival.timestamp, t0() + Duration::seconds(4000));
        assert_eq!(arrival.position, Point::new(PORT_LAT, PORT_LON));
        assert!(helper.store.ports_with_activity().contains(&port));

        let segments = helper.store.segments(vessel);
        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|s| s.excursion_id == excursions[0].id));
    })
    .await;
}

#[tokio::test]
async fn test_departure_after_reporting_gap_is_back_dated() {
    test(|helper| async move {
        let port = helper.port(1, PORT_LAT, PORT_LON);
        let vessel = helper
            .vessel(1)
            .at(0, 47.0, -4.0)
            .at(600, 47.05, -4.0)
            .at(4000, PORT_LAT, PORT_LON)
            .build();

        helper.run_segmentation().await;

        // 3.5 nautical miles north of the port, reported an hour later.
        helper
            .vessel(1)
            .at(7600, PORT_LAT + 3.5 / 60.0, PORT_LON)
            .build();

        helper.run_segmentation().await;

        let excursions = helper.store.excursions(vessel);
        assert_eq!(excursions.len(), 2);
        assert!(!excursions[0].is_open());
        assert!(excursions[1].is_open());

        let departure = &excursions[1].departure;
        assert_eq!(departure.port_id, Some(port));
        assert_eq!(departure.position, Some(Point::new(PORT_LAT, PORT_LON)));

        let expected = t0() + Duration::seconds(7600 - 1800);
        let diff = (departure.timestamp.unwrap() - expected).num_seconds().abs();
        assert!(diff <= 5, "departure off by {diff}s");

        let segments = helper.store.segments(vessel);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[2].segment_type, SegmentType::DefaultAis);
        assert_eq!(segments[2].excursion_id, excursions[1].id);
    })
    .await;
}

#[tokio::test]
async fn test_vessel_has_at_most_one_open_excursion() {
    test(|helper| async move {
        helper.port(1, PORT_LAT, PORT_LON);
        helper.port(2, 46.0, -4.0);

        let vessel = helper
            .vessel(1)
            .at(0, 47.0, -4.0)
            .at(600, 47.05, -4.0)
            .at(4000, PORT_LAT, PORT_LON)
            .build();
        helper.run_segmentation().await;

        helper
            .vessel(1)
            .at(4600, 47.15, -4.0)
            .at(5200, 47.0, -4.0)
            .at(9000, 46.0, -4.0)
            .build();
        helper.run_segmentation().await;

        helper
            .vessel(1)
            .at(9600, 46.05, -4.0)
            .at(10200, 46.1, -4.0)
            .build();
        helper.run_segmentation().await;

        let excursions = helper.store.excursions(vessel);
        assert_eq!(excursions.len(), 3);
        assert_eq!(excursions.iter().filter(|e| e.is_open()).count(), 1);
        assert!(excursions[2].is_open());
        assert_eq!(
            excursions[2].departure.port_id,
            excursions[1].arrival.as_ref().map(|a| a.port_id)
        );

        let segments = helper.store.segments(vessel);
        assert_eq!(segments.iter().filter(|s| s.last_vessel_segment).count(), 1);
        assert!(
            segments
                .iter()
                .all(|s| excursions.iter().any(|e| e.id == s.excursion_id))
        );
    })
    .await;
}

#[tokio::test]
async fn test_multiple_resumption_anchors_are_an_inconsistency() {
    test(|helper| async move {
        let vessel = helper.vessel(1).at(2000, 47.1, -4.0).build();
        let excursion = ExcursionId::new(1);

        helper.store.add_excursion(open_excursion(1, vessel));
        helper.store.add_segment(segment(1, vessel, excursion, 600));
        helper.store.add_segment(segment(2, vessel, excursion, 1200));

        let err = load_vessel_history(&*helper.store, vessel)
            .await
            .unwrap_err();
        assert!(err.core().is_some_and(|e| e.is_inconsistency()));

        let report = helper.run_segmentation().await;
        assert_eq!(report.num_failed, 1);
        assert_eq!(helper.store.segments(vessel).len(), 2);
        assert!(helper.store.retries().contains_key(&vessel));
    })
    .await;
}

#[tokio::test]
async fn test_anchor_with_missing_excursion_is_an_inconsistency() {
    test(|helper| async move {
        let vessel = helper.vessel(1).build();
        helper
            .store
            .add_segment(segment(1, vessel, ExcursionId::new(42), 600));

        let err = load_vessel_history(&*helper.store, vessel)
            .await
            .unwrap_err();
        assert!(err.core().is_some_and(|e| e.is_inconsistency()));
    })
    .await;
}

#[tokio::test]
async fn test_open_excursion_without_anchor_is_resumed() {
    test(|helper| async move {
        let vessel = helper
            .vessel(1)
            .at(0, 47.0, -4.0)
            .at(600, 47.05, -4.0)
            .build();
        helper.store.add_excursion(open_excursion(7, vessel));

        helper.run_segmentation().await;

        let excursions = helper.store.excursions(vessel);
        assert_eq!(excursions.len(), 1);
        assert!(
            helper
                .store
                .segments(vessel)
                .iter()
                .all(|s| s.excursion_id == ExcursionId::new(7))
        );
    })
    .await;
}
