mod aggregation;
mod date_range;
mod excursions;
mod metrics;
mod ports;
mod positions;
mod segmentation;
mod segments;
mod task_execution;
mod vessels;
mod zones;

pub use aggregation::*;
pub use date_range::*;
pub use excursions::*;
pub use metrics::*;
pub use ports::*;
pub use positions::*;
pub use segmentation::*;
pub use segments::*;
pub use task_execution::*;
pub use vessels::*;
pub use zones::*;
