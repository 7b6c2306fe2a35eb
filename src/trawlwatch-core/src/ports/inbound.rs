use crate::*;
use async_trait::async_trait;

#[async_trait]
pub trait SegmentationInbound: Send + Sync {
    /// Persists new segments and excursions, closes excursions, moves the resumption anchors,
    /// records or clears retries and advances the checkpoint within a single transaction.
    async fn commit_segmentation(
        &self,
        batch: SegmentationBatch,
        checkpoint: Option<CheckpointAdvance>,
    ) -> CoreResult<()>;
}

#[async_trait]
pub trait AggregationInbound: Send + Sync {
    async fn commit_aggregation(
        &self,
        batch: AggregationBatch,
        checkpoint: CheckpointAdvance,
    ) -> CoreResult<()>;
}
