#![deny(warnings)]
#![deny(rust_2018_idioms)]

use std::sync::Arc;
use trawlwatch_core::{
    AggregationInbound, AggregationOutbound, CheckpointStore, PositionSource,
    SegmentationInbound, SegmentationOutbound, SpatialStore,
};

pub mod error;
pub mod excursions;
pub mod pipeline;
pub mod segmentation;
pub mod settings;
pub mod startup;
pub mod states;
pub mod zones;

pub use error::{Error, Result};
pub use excursions::*;
pub use pipeline::*;
pub use segmentation::*;
pub use settings::*;
pub use startup::*;
pub use states::*;
pub use zones::*;

pub trait Database:
    PositionSource
    + SpatialStore
    + SegmentationOutbound
    + SegmentationInbound
    + AggregationOutbound
    + AggregationInbound
    + CheckpointStore
    + Send
    + Sync
    + 'static
{
}

impl<T> Database for T where
    T: PositionSource
        + SpatialStore
        + SegmentationOutbound
        + SegmentationInbound
        + AggregationOutbound
        + AggregationInbound
        + CheckpointStore
        + 'static
{
}

/// Every port the pipeline stages depend on, all backed by the same adapter in production.
#[derive(Clone)]
pub struct SharedState {
    pub settings: EngineSettings,
    pub position_source: Arc<dyn PositionSource>,
    pub spatial_store: Arc<dyn SpatialStore>,
    pub segmentation_outbound: Arc<dyn SegmentationOutbound>,
    pub segmentation_inbound: Arc<dyn SegmentationInbound>,
    pub aggregation_outbound: Arc<dyn AggregationOutbound>,
    pub aggregation_inbound: Arc<dyn AggregationInbound>,
    pub checkpoint_store: Arc<dyn CheckpointStore>,
}

impl SharedState {
    pub fn new<T: Database>(settings: EngineSettings, database: T) -> SharedState {
        SharedState::from_arc(settings, Arc::new(database))
    }

    pub fn from_arc<T: Database>(settings: EngineSettings, database: Arc<T>) -> SharedState {
        SharedState {
            settings,
            position_source: database.clone(),
            spatial_store: database.clone(),
            segmentation_outbound: database.clone(),
            segmentation_inbound: database.clone(),
            aggregation_outbound: database.clone(),
            aggregation_inbound: database.clone(),
            checkpoint_store: database,
        }
    }
}
