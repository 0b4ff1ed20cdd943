//! FIELD files: header, units, molecule blocks and file-level potential
//! blocks, terminated by `close`.

pub mod reader;
pub mod writer;

pub use reader::read;
pub use writer::write;
