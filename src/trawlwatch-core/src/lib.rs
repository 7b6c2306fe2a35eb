#![deny(warnings)]
#![deny(rust_2018_idioms)]

mod domain;
mod error;
mod geodesy;
mod ports;
mod retry;

#[cfg(feature = "test")]
pub mod test_helper;

pub use domain::*;
pub use error::*;
pub use geodesy::*;
pub use ports::*;
pub use retry::*;
