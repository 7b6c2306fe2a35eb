use crate::{ExcursionArrival, NewExcursion, NewSegment, PortId, SegmentId, VesselId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, de};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Segments at least this long are considered reporting gaps (`DEFAULT_AIS`).
    #[serde(with = "humantime_serde")]
    pub default_ais_gap: Duration,
    /// Segments slower than this trigger a port lookup.
    pub in_port_speed_knots: f64,
    pub port_radius_meters: f64,
    /// Speed assumed when back-dating the departure of an excursion opened after a gap.
    #[serde(deserialize_with = "deserialize_positive")]
    pub average_exit_speed_knots: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            default_ais_gap: Duration::from_secs(2100),
            in_port_speed_knots: 0.1,
            port_radius_meters: 5000.0,
            average_exit_speed_knots: 7.0,
        }
    }
}

fn deserialize_positive<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(de::Error::invalid_value(
            de::Unexpected::Float(value),
            &"a positive speed",
        ))
    }
}

/// Everything produced for a single vessel during one segmentation run.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselSegmentation {
    pub vessel_id: VesselId,
    pub segments: Vec<NewSegment>,
    pub new_excursions: Vec<NewExcursion>,
    pub closed_excursions: Vec<ExcursionArrival>,
    pub ports_with_activity: Vec<PortId>,
    /// The resumption anchor that loses its `last_vessel_segment` flag on commit.
    pub previous_anchor: Option<SegmentId>,
    pub num_positions: usize,
    pub num_discarded: usize,
    pub max_created_at: Option<DateTime<Utc>>,
}

/// A vessel whose segmentation failed, its positions created after `resume_from` are
/// segmented on a later run regardless of where the stage watermark has moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentationRetry {
    pub vessel_id: VesselId,
    pub resume_from: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentationBatch {
    /// Vessels segmented successfully, their pending retries are cleared on commit.
    pub vessels: Vec<VesselSegmentation>,
    /// Vessels that failed, an existing retry keeps the earlier `resume_from`.
    pub retries: Vec<SegmentationRetry>,
}

impl VesselSegmentation {
    pub fn new(vessel_id: VesselId) -> Self {
        Self {
            vessel_id,
            segments: vec![],
            new_excursions: vec![],
            closed_excursions: vec![],
            ports_with_activity: vec![],
            previous_anchor: None,
            num_positions: 0,
            num_discarded: 0,
            max_created_at: None,
        }
    }
}
