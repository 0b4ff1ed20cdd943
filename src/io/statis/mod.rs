//! STATIS time series. Reading reshapes the numeric stream into a matrix;
//! [`flatten`] splits it into one two-column file per quantity.

pub mod reader;
pub mod writer;

pub use reader::read;
pub use writer::flatten;
