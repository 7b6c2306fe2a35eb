//! In-memory implementation of every port, used to run the engine in tests without a database.

use crate::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geo::Intersects;
use geoutils::Location;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default, Clone)]
struct Inner {
    positions: Vec<Position>,
    ports: Vec<(PortId, Point)>,
    zones: Vec<Zone>,
    vessels: HashMap<VesselId, VesselSnapshot>,
    segments: Vec<Segment>,
    excursions: Vec<Excursion>,
    relations: Vec<SegmentZone>,
    metrics: Vec<NewMetrics>,
    ports_with_activity: HashSet<PortId>,
    task_executions: HashMap<TaskName, TaskExecution>,
    retries: HashMap<VesselId, DateTime<Utc>>,
    failing_vessels: HashSet<VesselId>,
    port_lookup_timeouts: usize,
    port_lookups: usize,
    next_segment_id: i64,
    next_excursion_id: i64,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn add_position(&self, position: Position) {
        self.inner.lock().unwrap().positions.push(position);
    }

    pub fn add_port(&self, id: PortId, point: Point) {
        self.inner.lock().unwrap().ports.push((id, point));
    }

    pub fn add_zone(&self, zone: Zone) {
        self.inner.lock().unwrap().zones.push(zone);
    }

    pub fn add_vessel(&self, vessel: VesselSnapshot) {
        self.inner.lock().unwrap().vessels.insert(vessel.id, vessel);
    }

    pub fn add_segment(&self, segment: Segment) {
        let mut inner = self.inner.lock().unwrap();
        inner.next_segment_id = inner.next_segment_id.max(segment.id.into_inner());
        inner.segments.push(segment);
    }

    pub fn add_excursion(&self, excursion: Excursion) {
        let mut inner = self.inner.lock().unwrap();
        inner.next_excursion_id = inner.next_excursion_id.max(excursion.id.into_inner());
        inner.excursions.push(excursion);
    }

    /// Every position read of the vessel fails until further notice.
    pub fn fail_vessel(&self, vessel_id: VesselId) {
        self.inner.lock().unwrap().failing_vessels.insert(vessel_id);
    }

    pub fn heal_vessel(&self, vessel_id: VesselId) {
        self.inner.lock().unwrap().failing_vessels.remove(&vessel_id);
    }

    /// The next `n` port lookups fail with a timeout.
    pub fn time_out_port_lookups(&self, n: usize) {
        self.inner.lock().unwrap().port_lookup_timeouts = n;
    }

    pub fn num_port_lookups(&self) -> usize {
        self.inner.lock().unwrap().port_lookups
    }

    pub fn set_in_flight(&self, task_name: TaskName, since: DateTime<Utc>) {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        inner
            .task_executions
            .entry(task_name)
            .or_insert_with(|| TaskExecution {
                task_name,
                point_in_time: TaskName::initial_watermark(),
                duration: None,
                position_count: 0,
                in_flight_since: None,
                updated_at: now,
            })
            .in_flight_since = Some(since);
    }

    pub fn segments(&self, vessel_id: VesselId) -> Vec<Segment> {
        let mut segments: Vec<Segment> = self
            .inner
            .lock()
            .unwrap()
            .segments
            .iter()
            .filter(|s| s.vessel_id == vessel_id)
            .cloned()
            .collect();
        segments.sort_by_key(|s| s.timestamp_start);
        segments
    }

    pub fn all_segments(&self) -> Vec<Segment> {
        self.inner.lock().unwrap().segments.clone()
    }

    pub fn excursions(&self, vessel_id: VesselId) -> Vec<Excursion> {
        let mut excursions: Vec<Excursion> = self
            .inner
            .lock()
            .unwrap()
            .excursions
            .iter()
            .filter(|e| e.vessel_id == vessel_id)
            .cloned()
            .collect();
        excursions.sort_by_key(|e| e.id);
        excursions
    }

    pub fn relations(&self) -> Vec<SegmentZone> {
        self.inner.lock().unwrap().relations.clone()
    }

    pub fn metrics(&self) -> Vec<NewMetrics> {
        self.inner.lock().unwrap().metrics.clone()
    }

    pub fn ports_with_activity(&self) -> HashSet<PortId> {
        self.inner.lock().unwrap().ports_with_activity.clone()
    }

    pub fn retries(&self) -> HashMap<VesselId, DateTime<Utc>> {
        self.inner.lock().unwrap().retries.clone()
    }
}

#[async_trait]
impl PositionSource for MemoryStore {
    async fn vessels_with_new_positions(&self, range: &DateRange) -> CoreResult<Vec<VesselId>> {
        let inner = self.inner.lock().unwrap();
        let mut vessels: Vec<VesselId> = inner
            .positions
            .iter()
            .filter(|p| range.contains(p.created_at))
            .map(|p| p.vessel_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        vessels.sort();
        Ok(vessels)
    }

    async fn positions_since(
        &self,
        vessel_id: VesselId,
        range: &DateRange,
    ) -> CoreResult<Vec<Position>> {
        let inner = self.inner.lock().unwrap();
        if inner.failing_vessels.contains(&vessel_id) {
            return Err(Error::unexpected(format!(
                "positions of vessel {vessel_id} are unavailable"
            )));
        }
        let mut positions: Vec<Position> = inner
            .positions
            .iter()
            .filter(|p| p.vessel_id == vessel_id && range.contains(p.created_at))
            .cloned()
            .collect();
        positions.sort_by_key(|p| p.timestamp);
        Ok(positions)
    }
}

#[async_trait]
impl SpatialStore for MemoryStore {
    async fn nearest_port(&self, point: &Point, radius_meters: f64) -> CoreResult<Option<PortId>> {
        let mut inner = self.inner.lock().unwrap();
        inner.port_lookups += 1;
        if inner.port_lookup_timeouts > 0 {
            inner.port_lookup_timeouts -= 1;
            return Err(Error::timeout("port lookup timed out"));
        }

        let from = Location::new(point.latitude, point.longitude);
        Ok(inner
            .ports
            .iter()
            .map(|(id, p)| {
                let to = Location::new(p.latitude, p.longitude);
                (*id, from.haversine_distance_to(&to).meters())
            })
            .filter(|(_, distance)| *distance <= radius_meters)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id))
    }

    async fn zones_intersecting(&self, start: &Point, end: &Point) -> CoreResult<Vec<Zone>> {
        let line = geo::Line::new(geo::Coord::from(start), geo::Coord::from(end));
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .zones
            .iter()
            .filter(|z| z.geometry.intersects(&line))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SegmentationOutbound for MemoryStore {
    async fn last_vessel_segments(&self, vessel_id: VesselId) -> CoreResult<Vec<Segment>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .segments
            .iter()
            .filter(|s| s.vessel_id == vessel_id && s.last_vessel_segment)
            .cloned()
            .collect())
    }

    async fn excursion(&self, id: ExcursionId) -> CoreResult<Option<Excursion>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.excursions.iter().find(|e| e.id == id).cloned())
    }

    async fn open_excursions(&self, vessel_id: VesselId) -> CoreResult<Vec<Excursion>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .excursions
            .iter()
            .filter(|e| e.vessel_id == vessel_id && e.is_open())
            .cloned()
            .collect())
    }

    async fn last_excursion(&self, vessel_id: VesselId) -> CoreResult<Option<Excursion>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .excursions
            .iter()
            .filter(|e| e.vessel_id == vessel_id)
            .max_by_key(|e| e.id)
            .cloned())
    }

    async fn pending_retries(&self) -> CoreResult<Vec<SegmentationRetry>> {
        let inner = self.inner.lock().unwrap();
        let mut retries: Vec<SegmentationRetry> = inner
            .retries
            .iter()
            .map(|(vessel_id, resume_from)| SegmentationRetry {
                vessel_id: *vessel_id,
                resume_from: *resume_from,
            })
            .collect();
        retries.sort_by_key(|r| r.vessel_id);
        Ok(retries)
    }
}

#[async_trait]
impl SegmentationInbound for MemoryStore {
    async fn commit_segmentation(
        &self,
        batch: SegmentationBatch,
        checkpoint: Option<CheckpointAdvance>,
    ) -> CoreResult<()> {
        let mut guard = self.inner.lock().unwrap();
        // Writes go to a copy that replaces the store only once every vessel is applied.
        let mut inner = guard.clone();
        let now = Utc::now();

        for vessel in batch.vessels {
            let mut new_ids = Vec::with_capacity(vessel.new_excursions.len());
            for e in vessel.new_excursions {
                inner.next_excursion_id += 1;
                let id = ExcursionId::new(inner.next_excursion_id);
                new_ids.push(id);
                inner.excursions.push(Excursion {
                    id,
                    vessel_id: e.vessel_id,
                    departure: e.departure,
                    arrival: e.arrival,
                    totals: ExcursionTotals::default(),
                    created_at: now,
                    updated_at: now,
                });
            }

            for closed in vessel.closed_excursions {
                let excursion = inner
                    .excursions
                    .iter_mut()
                    .find(|e| e.id == closed.excursion_id)
                    .ok_or_else(|| {
                        Error::inconsistency(format!(
                            "closing unknown excursion {}",
                            closed.excursion_id
                        ))
                    })?;
                excursion.arrival = Some(closed.arrival);
                excursion.updated_at = now;
            }

            if let Some(anchor) = vessel.previous_anchor {
                if let Some(s) = inner.segments.iter_mut().find(|s| s.id == anchor) {
                    s.last_vessel_segment = false;
                    s.updated_at = now;
                }
            }

            for s in vessel.segments {
                let excursion_id = match s.excursion {
                    ExcursionRef::Existing(id) => id,
                    ExcursionRef::New(idx) => *new_ids.get(idx).ok_or_else(|| {
                        Error::inconsistency(format!("segment references new excursion {idx}"))
                    })?,
                };
                inner.next_segment_id += 1;
                let id = SegmentId::new(inner.next_segment_id);
                inner.segments.push(Segment {
                    id,
                    vessel_id: s.vessel_id,
                    excursion_id,
                    timestamp_start: s.timestamp_start,
                    timestamp_end: s.timestamp_end,
                    start_position: s.start_position,
                    end_position: s.end_position,
                    distance: s.distance,
                    duration: s.duration,
                    average_speed: s.average_speed,
                    segment_type: s.segment_type,
                    in_amp_zone: false,
                    in_territorial_waters: false,
                    in_zone_with_no_fishing_rights: false,
                    last_vessel_segment: s.last_vessel_segment,
                    zones_matched: false,
                    created_at: now,
                    updated_at: now,
                });
            }

            inner.ports_with_activity.extend(vessel.ports_with_activity);
            inner.retries.remove(&vessel.vessel_id);
        }

        for retry in batch.retries {
            inner
                .retries
                .entry(retry.vessel_id)
                .and_modify(|r| *r = (*r).min(retry.resume_from))
                .or_insert(retry.resume_from);
        }

        if let Some(checkpoint) = checkpoint {
            inner.store_checkpoint(checkpoint, now);
        }

        *guard = inner;

        Ok(())
    }
}

#[async_trait]
impl AggregationOutbound for MemoryStore {
    async fn unmatched_segments(
        &self,
        since: DateTime<Utc>,
        limit: u32,
    ) -> CoreResult<Vec<SegmentWithVessel>> {
        let inner = self.inner.lock().unwrap();
        let mut segments: Vec<&Segment> = inner
            .segments
            .iter()
            .filter(|s| !s.zones_matched && s.modified_at() >= since)
            .collect();
        segments.sort_by_key(|s| (s.modified_at(), s.id));

        Ok(segments
            .into_iter()
            .take(limit as usize)
            .map(|s| SegmentWithVessel {
                segment: s.clone(),
                vessel: inner
                    .vessels
                    .get(&s.vessel_id)
                    .cloned()
                    .unwrap_or(VesselSnapshot {
                        id: s.vessel_id,
                        mmsi: None,
                        name: None,
                        imo: None,
                        country_iso3: None,
                    }),
            })
            .collect())
    }

    async fn excursions_by_ids(&self, ids: &[ExcursionId]) -> CoreResult<Vec<Excursion>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .excursions
            .iter()
            .filter(|e| ids.contains(&e.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AggregationInbound for MemoryStore {
    async fn commit_aggregation(
        &self,
        batch: AggregationBatch,
        checkpoint: CheckpointAdvance,
    ) -> CoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();

        for update in batch.segment_updates {
            if let Some(s) = inner.segments.iter_mut().find(|s| s.id == update.segment_id) {
                s.in_amp_zone = update.flags.in_amp_zone;
                s.in_territorial_waters = update.flags.in_territorial_waters;
                s.in_zone_with_no_fishing_rights = update.flags.in_zone_with_no_fishing_rights;
                s.zones_matched = true;
                s.updated_at = now;
            }
        }

        for relation in batch.relations {
            if !inner.relations.contains(&relation) {
                inner.relations.push(relation);
            }
        }

        for m in batch.metrics {
            let exists = inner
                .metrics
                .iter()
                .any(|e| e.segment_id == m.segment_id && e.zone_id == m.zone_id);
            if !exists {
                inner.metrics.push(m);
            }
        }

        for update in batch.excursions {
            if let Some(e) = inner
                .excursions
                .iter_mut()
                .find(|e| e.id == update.excursion_id)
            {
                e.totals = update.totals;
                e.updated_at = now;
            }
        }

        inner.store_checkpoint(checkpoint, now);

        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn get_watermark(&self, task_name: TaskName) -> CoreResult<DateTime<Utc>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .task_executions
            .get(&task_name)
            .map(|t| t.point_in_time)
            .unwrap_or_else(TaskName::initial_watermark))
    }

    async fn task_execution(&self, task_name: TaskName) -> CoreResult<Option<TaskExecution>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .task_executions
            .get(&task_name)
            .cloned())
    }

    async fn begin_task(
        &self,
        task_name: TaskName,
        stale_after: std::time::Duration,
    ) -> CoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let stale_after = chrono::Duration::from_std(stale_after).map_err(Error::unexpected)?;

        let execution = inner
            .task_executions
            .entry(task_name)
            .or_insert_with(|| TaskExecution {
                task_name,
                point_in_time: TaskName::initial_watermark(),
                duration: None,
                position_count: 0,
                in_flight_since: None,
                updated_at: now,
            });

        match execution.in_flight_since {
            Some(since) if now - since < stale_after => Err(Error::task_in_flight(task_name)),
            _ => {
                execution.in_flight_since = Some(now);
                Ok(())
            }
        }
    }

    async fn release_task(&self, task_name: TaskName) -> CoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(t) = inner.task_executions.get_mut(&task_name) {
            t.in_flight_since = None;
        }
        Ok(())
    }

    async fn advance_watermark(&self, checkpoint: CheckpointAdvance) -> CoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.store_checkpoint(checkpoint, Utc::now());
        Ok(())
    }
}

impl Inner {
    fn store_checkpoint(&mut self, checkpoint: CheckpointAdvance, now: DateTime<Utc>) {
        let in_flight_since = self
            .task_executions
            .get(&checkpoint.task_name)
            .and_then(|t| t.in_flight_since);

        self.task_executions.insert(
            checkpoint.task_name,
            TaskExecution {
                task_name: checkpoint.task_name,
                point_in_time: checkpoint.point_in_time,
                duration: checkpoint.duration,
                position_count: checkpoint.position_count,
                in_flight_since,
                updated_at: now,
            },
        );
    }
}
