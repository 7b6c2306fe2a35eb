use crate::helper::*;
use chrono::Duration;
use trawlwatch_core::{Excursion, MetricsType, SegmentType, VesselId};

static FISHING_COASTAL_WATERS: &str = "Fishing coastal waters (6-12 NM)";

fn assert_conserved(helper: &TestHelper, vessel: VesselId) -> Vec<Excursion> {
    let segments = helper.store.segments(vessel);
    let excursions = helper.store.excursions(vessel);

    for e in &excursions {
        assert!(e.totals.is_conserved(), "{:?}", e.totals);
        let total = segments
            .iter()
            .filter(|s| s.excursion_id == e.id)
            .fold(Duration::zero(), |acc, s| acc + s.duration);
        assert_eq!(e.totals.excursion_duration, total);
    }

    excursions
}

#[tokio::test]
async fn test_foreign_vessel_in_coastal_waters_has_no_fishing_rights() {
    test(|helper| async move {
        let zone = helper.zone(
            1,
            FISHING_COASTAL_WATERS,
            &["FRA", "BEL"],
            (46.9, -4.5),
            (47.5, -3.5),
        );
        let spanish = helper
            .vessel(1)
            .country(Some("ESP"))
            .at(0, 47.0, -4.0)
            .at(600, 47.05, -4.0)
            .build();
        let belgian = helper
            .vessel(2)
            .country(Some("BEL"))
            .at(0, 47.2, -4.0)
            .at(600, 47.25, -4.0)
            .build();

        helper.run().await;

        let segment = &helper.store.segments(spanish)[0];
        assert!(segment.zones_matched);
        assert!(segment.in_zone_with_no_fishing_rights);
        assert!(!segment.in_territorial_waters);

        let totals = assert_conserved(&helper, spanish)[0].totals;
        assert_eq!(
            totals.total_time_in_zones_with_no_fishing_rights,
            Duration::seconds(600)
        );
        assert_eq!(totals.total_time_at_sea, Duration::zero());

        let segment = &helper.store.segments(belgian)[0];
        assert!(segment.zones_matched);
        assert!(!segment.in_zone_with_no_fishing_rights);

        let totals = assert_conserved(&helper, belgian)[0].totals;
        assert_eq!(totals.total_time_at_sea, Duration::seconds(600));

        let metrics = helper.store.metrics();
        assert_eq!(metrics.len(), 2);
        assert!(metrics.iter().all(|m| m.zone_id == zone
            && m.metrics_type == MetricsType::InZoneWithNoFishingRights
            && m.duration_total == Duration::seconds(600)
            && m.duration_fishing.is_none()
            && m.zone_category == FISHING_COASTAL_WATERS));
        assert_eq!(helper.store.relations().len(), 2);
    })
    .await;
}

#[tokio::test]
async fn test_excursion_totals_are_conserved_over_overlapping_zones() {
    test(|helper| async move {
        let territorial = helper.zone(1, "Territorial seas", &[], (46.95, -4.5), (47.12, -3.5));
        helper.zone(2, "amp", &[], (47.08, -4.5), (47.22, -3.5));
        let clipped = helper.zone(
            3,
            "Clipped territorial seas",
            &[],
            (47.18, -4.5),
            (47.3, -3.5),
        );

        let vessel = helper
            .vessel(1)
            .country(Some("ESP"))
            .at(0, 47.0, -4.0)
            .at(600, 47.05, -4.0)
            .at(1200, 47.1, -4.0)
            .at(1800, 47.15, -4.0)
            .at(2400, 47.2, -4.0)
            .at(3000, 47.25, -4.0)
            .at(3600, 47.4, -4.0)
            .at(4200, 47.45, -4.0)
            .build();

        helper.run().await;

        let totals = assert_conserved(&helper, vessel)[0].totals;
        assert_eq!(totals.excursion_duration, Duration::seconds(4200));
        assert_eq!(totals.total_time_in_territorial_waters, Duration::seconds(1800));
        assert_eq!(
            totals.total_time_in_zones_with_no_fishing_rights,
            Duration::seconds(1800)
        );
        assert_eq!(totals.total_time_in_amp, Duration::seconds(2400));
        assert_eq!(totals.total_time_at_sea, Duration::seconds(600));

        let metrics = helper.store.metrics();
        let clipped_metrics: Vec<_> = metrics.iter().filter(|m| m.zone_id == clipped).collect();
        assert_eq!(clipped_metrics.len(), 3);
        assert!(
            clipped_metrics
                .iter()
                .all(|m| m.metrics_type == MetricsType::InZoneWithNoFishingRights)
        );
        assert!(
            metrics
                .iter()
                .filter(|m| m.zone_id == territorial)
                .all(|m| m.metrics_type == MetricsType::InTerritorialWater)
        );
    })
    .await;
}

#[tokio::test]
async fn test_rerunning_aggregation_does_not_duplicate_metrics() {
    test(|helper| async move {
        helper.zone(1, "Territorial seas", &[], (46.9, -4.5), (47.5, -3.5));

        let vessel = helper
            .vessel(1)
            .at(0, 47.0, -4.0)
            .at(600, 47.05, -4.0)
            .at(1200, 47.1, -4.0)
            .build();

        helper.run().await;

        let metrics = helper.store.metrics();
        let excursions = helper.store.excursions(vessel);
        assert_eq!(metrics.len(), 2);

        let report = helper.run_aggregation().await;
        assert_eq!(report.num_segments, 0);
        assert_eq!(helper.store.metrics(), metrics);
        assert_eq!(helper.store.excursions(vessel)[0].totals, excursions[0].totals);

        helper
            .vessel(1)
            .at(1800, 47.15, -4.0)
            .at(2400, 47.2, -4.0)
            .build();

        helper.run().await;
        helper.run().await;

        assert_eq!(helper.store.metrics().len(), 4);
        assert_eq!(helper.store.relations().len(), 4);

        let totals = assert_conserved(&helper, vessel)[0].totals;
        assert_eq!(totals.excursion_duration, Duration::seconds(2400));
        assert_eq!(totals.total_time_in_territorial_waters, Duration::seconds(2400));
    })
    .await;
}

#[tokio::test]
async fn test_reporting_gaps_are_not_matched_against_zones() {
    test(|helper| async move {
        helper.zone(1, "amp", &[], (46.9, -4.5), (47.5, -3.5));

        let vessel = helper
            .vessel(1)
            .at(0, 47.0, -4.0)
            .at(600, 47.05, -4.0)
            .at(4200, 47.3, -4.0)
            .build();

        let report = helper.run().await;
        let aggregation = report.aggregation.unwrap();
        assert_eq!(aggregation.num_segments, 2);
        assert_eq!(aggregation.num_zone_lookups, 1);

        let segments = helper.store.segments(vessel);
        assert!(segments.iter().all(|s| s.zones_matched));
        assert_eq!(segments[1].segment_type, SegmentType::DefaultAis);
        assert!(!segments[1].in_amp_zone);

        let relations = helper.store.relations();
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].segment_id, segments[0].id);

        let totals = assert_conserved(&helper, vessel)[0].totals;
        assert_eq!(totals.total_time_default_ais, Duration::seconds(3600));
        assert_eq!(totals.total_time_in_amp, Duration::seconds(600));
    })
    .await;
}
