use chrono::{DateTime, Utc};

mod aggregation;
mod segmentation;

pub use aggregation::*;
pub use segmentation::*;

/// What a stage has achieved so far, reported alongside the error if the stage fails midway.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageProgress {
    pub watermark: Option<DateTime<Utc>>,
    pub num_succeeded: u32,
    pub num_failed: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageReport {
    Segmentation(SegmentationReport),
    Aggregation(AggregationReport),
}
