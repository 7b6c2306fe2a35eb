mod excursion;
mod position;
mod segment;
mod segmentation_retry;
mod task_execution;
mod zone;

pub use excursion::*;
pub use position::*;
pub use segment::*;
pub use segmentation_retry::*;
pub use task_execution::*;
pub use zone::*;

use trawlwatch_core::Point;

/// Durations are stored as seconds in `DOUBLE PRECISION` columns.
pub fn seconds(duration: chrono::Duration) -> f64 {
    duration.num_seconds() as f64 + duration.subsec_nanos() as f64 / 1_000_000_000.0
}

pub fn from_seconds(seconds: f64) -> chrono::Duration {
    chrono::Duration::microseconds((seconds * 1_000_000.0).round() as i64)
}

pub fn point(latitude: Option<f64>, longitude: Option<f64>) -> Option<Point> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(Point::new(latitude, longitude)),
        _ => None,
    }
}
