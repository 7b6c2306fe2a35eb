mod excursion;
mod metrics;
mod port;
mod position;
mod segment;
mod segmentation_retry;
mod task_execution;
mod zone;
