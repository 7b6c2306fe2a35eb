#![deny(warnings)]
#![deny(rust_2018_idioms)]

pub mod excursions;
pub mod helper;
pub mod pipeline;
pub mod segmentation;
pub mod zones;
