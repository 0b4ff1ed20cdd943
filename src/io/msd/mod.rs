//! MSDTMP per-atom displacement frames (read only).

pub mod reader;

pub use reader::read;
