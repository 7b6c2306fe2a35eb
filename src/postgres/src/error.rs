use snafu::{Location, Snafu};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Failed to establish a database connection"))]
    Connection {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: sqlx::Error,
    },
    #[snafu(display("Failed to run migrations"))]
    Migrate {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: sqlx::migrate::MigrateError,
    },
    #[snafu(display("Sqlx error"))]
    Sqlx {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: sqlx::Error,
    },
    #[snafu(display("Database timeout error"))]
    Timeout {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: sqlx::Error,
    },
    #[snafu(display("Failed to convert a column value: {description}"))]
    DataConversion {
        #[snafu(implicit)]
        location: Location,
        description: String,
    },
    #[snafu(display("Encountered an invalid task name"))]
    TaskName {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: strum::ParseError,
    },
}

impl From<sqlx::Error> for Error {
    #[track_caller]
    fn from(value: sqlx::Error) -> Self {
        let location = std::panic::Location::caller();
        let location = Location::new(location.file(), location.line(), location.column());
        match &value {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Error::Timeout {
                    location,
                    error: value,
                }
            }
            sqlx::Error::Database(e) if is_transient(e.code().as_deref()) => Error::Timeout {
                location,
                error: value,
            },
            _ => Error::Sqlx {
                location,
                error: value,
            },
        }
    }
}

impl From<Error> for trawlwatch_core::Error {
    #[track_caller]
    fn from(value: Error) -> Self {
        match value {
            Error::Timeout { .. } => trawlwatch_core::Error::timeout(value),
            _ => trawlwatch_core::Error::unexpected(value),
        }
    }
}

// Serialization failures, deadlocks and connection level failures.
fn is_transient(code: Option<&str>) -> bool {
    matches!(code, Some("40001" | "40P01" | "57P01" | "08000" | "08003" | "08006"))
}
