//! Readers and writers for the DL_POLY molecular-dynamics file family.
//!
//! Simulation inputs (CONTROL, FIELD, CONFIG) are parsed into typed records
//! that can be edited and written back; outputs (STATIS, RDFDAT, MSDTMP) are
//! read into numeric tables with labelled columns.
//!
//! # Features
//!
//! - **Schema records** — CONTROL parameters live in [`Record`]s backed by
//!   static [`Schema`] tables, so every set is cast to the declared kind and
//!   unknown keys are rejected
//! - **Ensemble state machine** — [`EnsembleParam`] enforces which thermostat
//!   or barostat may follow each ensemble and how many arguments it takes
//! - **Interaction lookup** — FIELD potentials are keyed by canonically sorted
//!   atom tuples and can be queried by species, class or potential type
//! - **Both CONTROL layouts** — the classic directive file and the keyed
//!   `title`-first layout are detected per file by [`io::read_control`]
//! - **Configurable reading** — [`ReadOptions`] (loadable from TOML) selects
//!   strict or permissive parsing, the missing-file policy and when ensemble
//!   arity is checked
//!
//! # Quick Start
//!
//! ```
//! use dlpoly_io::io::{self, ReadOptions};
//! use std::io::Cursor;
//!
//! let text = "\
//! argon melt
//! temperature 120.0 K
//! steps 20000
//! ensemble nvt hoover 0.5
//! finish
//! ";
//! let mut control = io::control::read(Cursor::new(text), &ReadOptions::default())?;
//! assert_eq!(control.params.get_int("steps")?, Some(20000));
//! assert_eq!(control.ensemble.render()?, "nvt hoover 0.5");
//!
//! // Arity is checked before anything changes.
//! let args = vec!["0.5".to_string(), "1.5".to_string()];
//! control.ensemble.configure("npt".parse()?, Some("berendsen".parse()?), args)?;
//!
//! let mut out = Vec::new();
//! io::control::write(&mut out, &control)?;
//! let written = String::from_utf8(out).unwrap();
//! assert!(written.contains("\nensemble npt berendsen 0.5 1.5\n"));
//! # Ok::<(), dlpoly_io::Error>(())
//! ```
//!
//! # Module Organization
//!
//! - [`model`] — In-memory records for every file type
//! - [`io`] — Stream codecs per format plus path-level `read_*`/`write_*`

pub mod io;
pub mod model;

pub use io::error::Error;
pub use io::{ControlFile, Format, MissingFilePolicy, ReadOptions};

pub use model::config::{Atom, Config, Level, Pbc, Placement};
pub use model::control::{Control, DirectiveError};
pub use model::ensemble::{Arity, ArityCheck, Ensemble, EnsembleError, EnsembleParam, Means};
pub use model::field::{Field, Interaction, InteractionSet, Molecule, PotentialClass, Species};
pub use model::msd::Msd;
pub use model::new_control::NewControl;
pub use model::rdf::Rdf;
pub use model::schema::{Record, Schema, SchemaViolation, Value};
pub use model::statis::{Statis, StatisLayout};
pub use model::value::UnitValue;
