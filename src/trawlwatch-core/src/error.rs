use crate::TaskName;
use snafu::{Location, Snafu};

pub type CoreResult<T> = std::result::Result<T, Error>;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Operation timed out"))]
    Timeout {
        #[snafu(implicit)]
        location: Location,
        source: BoxedError,
    },
    #[snafu(display("Data inconsistency detected: {description}"))]
    Inconsistency {
        #[snafu(implicit)]
        location: Location,
        description: String,
    },
    #[snafu(display("Task '{task_name}' is already in flight"))]
    TaskInFlight {
        #[snafu(implicit)]
        location: Location,
        task_name: TaskName,
    },
    #[snafu(display("An unexpected error occured"))]
    Unexpected {
        #[snafu(implicit)]
        location: Location,
        source: BoxedError,
    },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DateRangeError {
    #[snafu(display("Start of range '{start}' is after end '{end}'"))]
    Ordering {
        #[snafu(implicit)]
        location: Location,
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },
}

impl Error {
    #[track_caller]
    pub fn inconsistency(description: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Error::Inconsistency {
            location: Location::new(location.file(), location.line(), location.column()),
            description: description.into(),
        }
    }

    #[track_caller]
    pub fn task_in_flight(task_name: TaskName) -> Self {
        let location = std::panic::Location::caller();
        Error::TaskInFlight {
            location: Location::new(location.file(), location.line(), location.column()),
            task_name,
        }
    }

    #[track_caller]
    pub fn timeout(source: impl Into<BoxedError>) -> Self {
        let location = std::panic::Location::caller();
        Error::Timeout {
            location: Location::new(location.file(), location.line(), location.column()),
            source: source.into(),
        }
    }

    #[track_caller]
    pub fn unexpected(source: impl Into<BoxedError>) -> Self {
        let location = std::panic::Location::caller();
        Error::Unexpected {
            location: Location::new(location.file(), location.line(), location.column()),
            source: source.into(),
        }
    }

    pub fn is_inconsistency(&self) -> bool {
        matches!(self, Error::Inconsistency { .. })
    }
}

impl From<DateRangeError> for Error {
    #[track_caller]
    fn from(value: DateRangeError) -> Self {
        Error::unexpected(value)
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    #[track_caller]
    fn from(value: tokio::time::error::Elapsed) -> Self {
        Error::timeout(value)
    }
}
