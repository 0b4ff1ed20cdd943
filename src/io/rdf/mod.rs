//! RDFDAT radial distribution functions (read only).

pub mod reader;

pub use reader::read;
