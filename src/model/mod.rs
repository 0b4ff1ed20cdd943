//! In-memory records for the DL_POLY file family.
//!
//! - [`schema`] – Static field tables and the typed [`Record`](schema::Record) built on them.
//! - [`value`] – Values with optional units and Fortran-style real parsing.
//! - [`ensemble`] – Ensemble/means state machine and the argument arity table.
//! - [`control`] – Simulation control parameters and their sub-records.
//! - [`new_control`] – The keyed CONTROL layout as one flat record.
//! - [`field`] – Molecules, species and interaction potentials.
//! - [`config`] – Cell and per-atom coordinates.
//! - [`statis`], [`rdf`], [`msd`] – Numeric outputs of a run.

pub mod config;
pub mod control;
pub mod ensemble;
pub mod field;
pub mod msd;
pub mod new_control;
pub mod rdf;
pub mod schema;
pub mod statis;
pub mod value;
