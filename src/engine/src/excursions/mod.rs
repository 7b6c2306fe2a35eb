use crate::error::Result;
use trawlwatch_core::{Error, ExcursionRef, Segment, SegmentationOutbound, VesselId};

mod statemachine;

pub use statemachine::*;

/// The vessel's resumption anchor together with the excursion state it implies.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselHistory {
    pub anchor: Option<Segment>,
    pub excursion_state: ExcursionState,
}

/// Reads the vessel's anchor and excursions and verifies that they agree with each other.
///
/// Fails with an inconsistency if the vessel has several anchors or several open excursions,
/// if the anchor's excursion does not exist, or if the open excursion is not the anchor's.
pub async fn load_vessel_history(
    outbound: &dyn SegmentationOutbound,
    vessel_id: VesselId,
) -> Result<VesselHistory> {
    let mut anchors = outbound.last_vessel_segments(vessel_id).await?;
    if anchors.len() > 1 {
        return Err(Error::inconsistency(format!(
            "vessel {vessel_id} has {} segments flagged as last vessel segment",
            anchors.len()
        ))
        .into());
    }

    let open = outbound.open_excursions(vessel_id).await?;
    if open.len() > 1 {
        return Err(Error::inconsistency(format!(
            "vessel {vessel_id} has {} open excursions",
            open.len()
        ))
        .into());
    }
    let open = open.into_iter().next();

    match anchors.pop() {
        Some(anchor) => {
            let excursion = outbound
                .excursion(anchor.excursion_id)
                .await?
                .ok_or_else(|| {
                    Error::inconsistency(format!(
                        "anchor segment {} of vessel {vessel_id} references missing excursion {}",
                        anchor.id, anchor.excursion_id
                    ))
                })?;

            if let Some(open) = &open {
                if open.id != excursion.id {
                    return Err(Error::inconsistency(format!(
                        "vessel {vessel_id} has open excursion {} but its anchor belongs to excursion {}",
                        open.id, excursion.id
                    ))
                    .into());
                }
            }

            let cursor = if excursion.is_open() {
                ExcursionCursor::OpenExcursion(ExcursionRef::Existing(excursion.id))
            } else {
                ExcursionCursor::NoOpenExcursion
            };

            Ok(VesselHistory {
                anchor: Some(anchor),
                excursion_state: ExcursionState {
                    cursor,
                    is_new_vessel: false,
                    last_arrival: excursion.arrival,
                },
            })
        }
        None => {
            let last_arrival = outbound
                .last_excursion(vessel_id)
                .await?
                .and_then(|e| e.arrival);

            let cursor = match open {
                Some(open) => ExcursionCursor::OpenExcursion(ExcursionRef::Existing(open.id)),
                None => ExcursionCursor::NoOpenExcursion,
            };

            Ok(VesselHistory {
                anchor: None,
                excursion_state: ExcursionState {
                    cursor,
                    is_new_vessel: true,
                    last_arrival,
                },
            })
        }
    }
}
