use chrono::{DateTime, Duration, TimeZone, Utc};
use engine::*;
use futures::Future;
use geo::polygon;
use std::sync::{Arc, Once};
use trawlwatch_core::{
    CheckpointStore, Point, PortId, Position, TaskName, VesselId, VesselSnapshot, Zone, ZoneCategory, ZoneId,
    test_helper::MemoryStore,
};
use tracing_subscriber::FmtSubscriber;

static TRACING: Once = Once::new();

/// Start of every generated track.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap()
}

pub struct TestHelper {
    pub store: Arc<MemoryStore>,
    pub settings: EngineSettings,
}

impl TestHelper {
    pub fn vessel(&self, id: i64) -> TestStateBuilder {
        TestStateBuilder {
            store: self.store.clone(),
            vessel: VesselSnapshot {
                id: VesselId::new(id),
                mmsi: Some(227_000_000 + id as i32),
                name: Some(format!("vessel {id}")),
                imo: None,
                country_iso3: Some("FRA".into()),
            },
            track: vec![],
            created_at: None,
        }
    }

    pub fn port(&self, id: i64, latitude: f64, longitude: f64) -> PortId {
        let id = PortId::new(id);
        self.store.add_port(id, Point::new(latitude, longitude));
        id
    }

    /// Adds a zone covering the given rectangle.
    pub fn zone(
        &self,
        id: i64,
        category: &str,
        beneficiaries: &[&str],
        (min_lat, min_lon): (f64, f64),
        (max_lat, max_lon): (f64, f64),
    ) -> ZoneId {
        let id = ZoneId::new(id);
        self.store.add_zone(Zone {
            id,
            category: ZoneCategory::from(category),
            sub_category: None,
            name: format!("zone {id}"),
            geometry: geo::Geometry::Polygon(polygon![
                (x: min_lon, y: min_lat),
                (x: max_lon, y: min_lat),
                (x: max_lon, y: max_lat),
                (x: min_lon, y: max_lat),
                (x: min_lon, y: min_lat),
            ]),
            beneficiaries: beneficiaries.iter().map(|b| b.to_string()).collect(),
        });
        id
    }

    pub async fn watermark(&self, task_name: TaskName) -> DateTime<Utc> {
        self.store.get_watermark(task_name).await.unwrap()
    }

    pub fn pipeline(&self, single_stage_run: Option<TaskName>) -> Pipeline {
        Pipeline::new(
            SharedState::from_arc(self.settings.clone(), self.store.clone()),
            single_stage_run,
        )
    }

    pub async fn run(&self) -> PipelineReport {
        self.pipeline(None).run().await.unwrap()
    }

    pub async fn run_segmentation(&self) -> SegmentationReport {
        match self
            .pipeline(None)
            .run_stage(TaskName::IngestAndSegment)
            .await
            .unwrap()
        {
            StageReport::Segmentation(r) => r,
            StageReport::Aggregation(r) => panic!("unexpected aggregation report: {r:?}"),
        }
    }

    pub async fn run_aggregation(&self) -> AggregationReport {
        match self
            .pipeline(None)
            .run_stage(TaskName::ClassifyAndAggregate)
            .await
            .unwrap()
        {
            StageReport::Aggregation(r) => r,
            StageReport::Segmentation(r) => panic!("unexpected segmentation report: {r:?}"),
        }
    }
}

/// Builds a vessel and its track of positions, offsets are in seconds from `t0`.
pub struct TestStateBuilder {
    store: Arc<MemoryStore>,
    vessel: VesselSnapshot,
    track: Vec<(i64, f64, f64)>,
    created_at: Option<DateTime<Utc>>,
}

impl TestStateBuilder {
    pub fn country(mut self, iso3: Option<&str>) -> Self {
        self.vessel.country_iso3 = iso3.map(|c| c.to_string());
        self
    }

    pub fn at(mut self, offset_secs: i64, latitude: f64, longitude: f64) -> Self {
        self.track.push((offset_secs, latitude, longitude));
        self
    }

    /// Ingestion time of the positions, defaults to the time of `build`.
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn build(self) -> VesselId {
        let id = self.vessel.id;
        self.store.add_vessel(self.vessel);
        for (offset, latitude, longitude) in self.track {
            self.store.add_position(Position {
                vessel_id: id,
                timestamp: t0() + Duration::seconds(offset),
                latitude,
                longitude,
                speed: None,
                heading: None,
                course: None,
                accuracy: None,
                collection_type: None,
                created_at: self.created_at.unwrap_or_else(Utc::now),
            });
        }
        id
    }
}

pub fn test_settings() -> EngineSettings {
    EngineSettings {
        num_workers: 2,
        batch_window: std::time::Duration::from_secs(100 * 365 * 24 * 3600),
        spatial_timeout: std::time::Duration::from_secs(1),
        ..Default::default()
    }
}

pub async fn test<T, Fut>(test: T)
where
    T: FnOnce(TestHelper) -> Fut,
    Fut: Future<Output = ()>,
{
    test_with_settings(test_settings(), test).await
}

pub async fn test_with_settings<T, Fut>(settings: EngineSettings, test: T)
where
    T: FnOnce(TestHelper) -> Fut,
    Fut: Future<Output = ()>,
{
    TRACING.call_once(|| {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder()
                .with_max_level(tracing::Level::INFO)
                .finish(),
        )
        .unwrap();
    });

    test(TestHelper {
        store: Arc::new(MemoryStore::new()),
        settings,
    })
    .await
}
