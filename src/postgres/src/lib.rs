#![deny(warnings)]
#![deny(rust_2018_idioms)]

mod adapter;
mod error;
mod models;
mod queries;
mod settings;

pub use adapter::PostgresAdapter;
pub use error::Error;
pub use settings::*;
