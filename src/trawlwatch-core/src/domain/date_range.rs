use crate::{DateRangeError, OrderingSnafu};
use chrono::{DateTime, Utc};

/// A half-open `(start, end]` range of timestamps.
///
/// Incremental batches are bounded by such a range where `start` is the previous watermark, which
/// has already been processed, and `end` is the inclusive upper bound of the current batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<DateRange, DateRangeError> {
        if end < start {
            return OrderingSnafu { start, end }.fail();
        }
        Ok(DateRange { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, value: DateTime<Utc>) -> bool {
        value > self.start && value <= self.end
    }
}
