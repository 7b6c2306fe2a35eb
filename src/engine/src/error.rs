use chrono::{DateTime, Utc};
use snafu::{Location, Snafu};
use tokio::task::JoinError;
use trawlwatch_core::{DateRangeError, TaskName};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Failed a core operation"))]
    Core {
        #[snafu(implicit)]
        location: Location,
        source: trawlwatch_core::Error,
    },
    #[snafu(display("Failed to join tasks"))]
    Join {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: JoinError,
    },
    #[snafu(display("Invalid date range"))]
    InvalidDateRange {
        #[snafu(implicit)]
        location: Location,
        source: DateRangeError,
    },
    #[snafu(display("Worker channel closed unexpectedly"))]
    ChannelClosed {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display(
        "Stage '{task_name}' failed, watermark: '{watermark:?}', num_succeeded: {num_succeeded}, num_failed: {num_failed}"
    ))]
    Stage {
        #[snafu(implicit)]
        location: Location,
        task_name: TaskName,
        watermark: Option<DateTime<Utc>>,
        num_succeeded: u32,
        num_failed: u32,
        source: Box<Error>,
    },
}

impl Error {
    /// The underlying core error, looking through stage wrapping.
    pub fn core(&self) -> Option<&trawlwatch_core::Error> {
        match self {
            Error::Core { source, .. } => Some(source),
            Error::Stage { source, .. } => source.core(),
            Error::Join { .. } | Error::InvalidDateRange { .. } | Error::ChannelClosed { .. } => {
                None
            }
        }
    }
}

impl From<trawlwatch_core::Error> for Error {
    #[track_caller]
    fn from(value: trawlwatch_core::Error) -> Self {
        let location = std::panic::Location::caller();
        Error::Core {
            location: Location::new(location.file(), location.line(), location.column()),
            source: value,
        }
    }
}

impl From<DateRangeError> for Error {
    #[track_caller]
    fn from(value: DateRangeError) -> Self {
        let location = std::panic::Location::caller();
        Error::InvalidDateRange {
            location: Location::new(location.file(), location.line(), location.column()),
            source: value,
        }
    }
}
