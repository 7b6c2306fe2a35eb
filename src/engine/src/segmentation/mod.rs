//! Turns an ordered batch of positions into contiguous kinematic segments.

use chrono::{DateTime, Duration, Utc};
use tracing::warn;
use trawlwatch_core::{Point, Position, Segment, SegmentType, SegmentationConfig, distance_nm};

/// A segment before it has been assigned to an excursion.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentCandidate {
    pub timestamp_start: DateTime<Utc>,
    pub timestamp_end: DateTime<Utc>,
    pub start_position: Point,
    pub end_position: Point,
    pub distance: f64,
    pub duration: Duration,
    pub average_speed: f64,
    pub segment_type: SegmentType,
    pub last_vessel_segment: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SegmentationOutcome {
    /// Fewer than two usable points, nothing to do until more positions arrive.
    NoData { num_discarded: usize },
    Segments {
        segments: Vec<SegmentCandidate>,
        num_discarded: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct ChainPoint {
    timestamp: DateTime<Utc>,
    point: Point,
}

/// Builds segments from `positions` continuing from the vessel's `anchor`, the last segment
/// produced by a prior run.
///
/// Positions at or before the end of the chain so far (late or replayed data, duplicate
/// timestamps) are discarded. A vessel without an anchor that only has a single usable position
/// gets a bootstrap start point one second before it so that it still receives a segment.
pub fn segment_positions(
    anchor: Option<&Segment>,
    mut positions: Vec<Position>,
    config: &SegmentationConfig,
) -> SegmentationOutcome {
    positions.sort_by_key(|p| p.timestamp);

    let mut chain: Vec<ChainPoint> = Vec::with_capacity(positions.len() + 1);
    if let Some(anchor) = anchor {
        chain.push(ChainPoint {
            timestamp: anchor.timestamp_end,
            point: anchor.end_position,
        });
    }

    let mut num_discarded = 0;
    for p in &positions {
        match chain.last() {
            Some(last) if p.timestamp <= last.timestamp => num_discarded += 1,
            _ => chain.push(ChainPoint {
                timestamp: p.timestamp,
                point: p.point(),
            }),
        }
    }

    if num_discarded > 0 {
        warn!("discarded {num_discarded} late or duplicate positions");
    }

    if anchor.is_none() && chain.len() == 1 {
        let first = chain[0];
        chain.insert(
            0,
            ChainPoint {
                timestamp: first.timestamp - Duration::seconds(1),
                point: first.point,
            },
        );
    }

    if chain.len() < 2 {
        return SegmentationOutcome::NoData { num_discarded };
    }

    let gap = Duration::from_std(config.default_ais_gap).unwrap_or(Duration::MAX);
    let num_segments = chain.len() - 1;

    let segments = chain
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let (start, end) = (pair[0], pair[1]);
            let duration = end.timestamp - start.timestamp;
            let distance = distance_nm(&start.point, &end.point);
            let hours = (duration.num_seconds() as f64
                + duration.subsec_nanos() as f64 / 1_000_000_000.0)
                / 3600.0;

            SegmentCandidate {
                timestamp_start: start.timestamp,
                timestamp_end: end.timestamp,
                start_position: start.point,
                end_position: end.point,
                distance,
                duration,
                average_speed: distance / hours,
                segment_type: if duration >= gap {
                    SegmentType::DefaultAis
                } else {
                    SegmentType::AtSea
                },
                last_vessel_segment: i == num_segments - 1,
            }
        })
        .collect();

    SegmentationOutcome::Segments {
        segments,
        num_discarded,
    }
}
