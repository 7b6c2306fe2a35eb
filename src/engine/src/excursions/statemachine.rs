use crate::SegmentCandidate;
use chrono::Duration;
use trawlwatch_core::{
    Arrival, Departure, ExcursionArrival, ExcursionRef, NewExcursion, NewSegment, PortId,
    SegmentType, SegmentationConfig, VesselId,
};

/// Where the vessel stands between segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcursionCursor {
    NoOpenExcursion,
    OpenExcursion(ExcursionRef),
}

/// What the state machine needs to know about the vessel's persisted history.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcursionState {
    pub cursor: ExcursionCursor,
    /// No resumption anchor exists for the vessel.
    pub is_new_vessel: bool,
    /// Arrival of the vessel's most recent closed excursion.
    pub last_arrival: Option<Arrival>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExcursionOutput {
    pub new_excursions: Vec<NewExcursion>,
    pub closed_excursions: Vec<ExcursionArrival>,
    pub ports_with_activity: Vec<PortId>,
}

/// Assigns segments to excursions, opening an excursion when the vessel leaves and closing it
/// when a segment ends close to a port.
///
/// Only excursions opened during this run are held in memory, they are referenced through
/// `ExcursionRef::New` and get their ids when the run is committed.
#[derive(Debug)]
pub struct ExcursionStatemachine {
    vessel_id: VesselId,
    in_port_speed_knots: f64,
    average_exit_speed_knots: f64,
    cursor: ExcursionCursor,
    is_new_vessel: bool,
    last_arrival: Option<Arrival>,
    output: ExcursionOutput,
}

impl ExcursionStatemachine {
    pub fn new(
        vessel_id: VesselId,
        state: ExcursionState,
        config: &SegmentationConfig,
    ) -> ExcursionStatemachine {
        ExcursionStatemachine {
            vessel_id,
            in_port_speed_knots: config.in_port_speed_knots,
            average_exit_speed_knots: config.average_exit_speed_knots,
            cursor: state.cursor,
            is_new_vessel: state.is_new_vessel,
            last_arrival: state.last_arrival,
            output: ExcursionOutput::default(),
        }
    }

    pub fn cursor(&self) -> ExcursionCursor {
        self.cursor
    }

    /// Reporting gaps and near stationary segments might end in a port.
    pub fn needs_port_lookup(&self, segment: &SegmentCandidate) -> bool {
        segment.segment_type == SegmentType::DefaultAis
            || segment.average_speed < self.in_port_speed_knots
    }

    /// `port` is the port found near the end of the segment, if it was looked up.
    pub fn advance(&mut self, segment: SegmentCandidate, port: Option<PortId>) -> NewSegment {
        let excursion = match (self.cursor, port) {
            (ExcursionCursor::OpenExcursion(excursion), Some(port_id)) => {
                self.close(
                    excursion,
                    Arrival {
                        port_id,
                        timestamp: segment.timestamp_end,
                        position: segment.end_position,
                    },
                );
                excursion
            }
            (ExcursionCursor::OpenExcursion(excursion), None) => excursion,
            (ExcursionCursor::NoOpenExcursion, _) => self.open(&segment),
        };

        NewSegment {
            vessel_id: self.vessel_id,
            excursion,
            timestamp_start: segment.timestamp_start,
            timestamp_end: segment.timestamp_end,
            start_position: segment.start_position,
            end_position: segment.end_position,
            distance: segment.distance,
            duration: segment.duration,
            average_speed: segment.average_speed,
            segment_type: segment.segment_type,
            last_vessel_segment: segment.last_vessel_segment,
        }
    }

    pub fn finish(self) -> ExcursionOutput {
        self.output
    }

    fn open(&mut self, segment: &SegmentCandidate) -> ExcursionRef {
        let departure = if self.is_new_vessel && self.output.new_excursions.is_empty() {
            self.last_arrival
                .as_ref()
                .map(|a| Departure {
                    port_id: Some(a.port_id),
                    timestamp: Some(a.timestamp),
                    position: Some(a.position),
                })
                .unwrap_or_default()
        } else {
            let timestamp = match segment.segment_type {
                SegmentType::DefaultAis => {
                    let hours = segment.distance / self.average_exit_speed_knots;
                    segment.timestamp_end
                        - Duration::milliseconds((hours * 3_600_000.0).round() as i64)
                }
                SegmentType::AtSea | SegmentType::Fishing => segment.timestamp_start,
            };
            Departure {
                port_id: self.last_arrival.as_ref().map(|a| a.port_id),
                timestamp: Some(timestamp),
                position: Some(segment.start_position),
            }
        };

        self.output.new_excursions.push(NewExcursion {
            vessel_id: self.vessel_id,
            departure,
            arrival: None,
        });

        let excursion = ExcursionRef::New(self.output.new_excursions.len() - 1);
        self.cursor = ExcursionCursor::OpenExcursion(excursion);
        excursion
    }

    fn close(&mut self, excursion: ExcursionRef, arrival: Arrival) {
        match excursion {
            ExcursionRef::New(idx) => {
                if let Some(e) = self.output.new_excursions.get_mut(idx) {
                    e.arrival = Some(arrival.clone());
                }
            }
            ExcursionRef::Existing(excursion_id) => {
                self.output.closed_excursions.push(ExcursionArrival {
                    excursion_id,
                    arrival: arrival.clone(),
                })
            }
        }

        self.output.ports_with_activity.push(arrival.port_id);
        self.last_arrival = Some(arrival);
        self.cursor = ExcursionCursor::NoOpenExcursion;
    }
}
