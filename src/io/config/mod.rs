//! CONFIG files: title, level/periodicity keys, optional cell and per-atom
//! coordinate records.

pub mod reader;
pub mod writer;

pub use reader::read;
pub use writer::write;
