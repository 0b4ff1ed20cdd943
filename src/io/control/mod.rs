//! CONTROL files: a title line, `keyword value... [unit]` directives and a
//! closing `finish`.

pub mod reader;
pub mod writer;

pub use reader::read;
pub use writer::write;
