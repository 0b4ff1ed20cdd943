use crate::model::config::Config;
use crate::model::control::Control;
use crate::model::ensemble::ArityCheck;
use crate::model::field::Field;
use crate::model::msd::Msd;
use crate::model::new_control::NewControl;
use crate::model::rdf::Rdf;
use crate::model::statis::Statis;
use log::warn;
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;

pub mod error;
pub mod util;

pub mod config;
pub mod control;
pub mod field;
pub mod msd;
pub mod new_control;
pub mod rdf;
pub mod statis;

use error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Control,
    Field,
    Config,
    Statis,
    Rdf,
    Msd,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Control => write!(f, "CONTROL"),
            Format::Field => write!(f, "FIELD"),
            Format::Config => write!(f, "CONFIG"),
            Format::Statis => write!(f, "STATIS"),
            Format::Rdf => write!(f, "RDFDAT"),
            Format::Msd => write!(f, "MSDTMP"),
        }
    }
}

/// What a path-level read does when the file does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingFilePolicy {
    /// Fail with [`Error::MissingFile`].
    #[default]
    Error,
    /// Log a warning and return a default record.
    Default,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReadOptions {
    /// Reject unknown keywords and blocks instead of skipping them.
    #[serde(default = "default_strict")]
    pub strict: bool,
    #[serde(default)]
    pub missing_file: MissingFilePolicy,
    #[serde(default)]
    pub arity_check: ArityCheck,
}

fn default_strict() -> bool {
    true
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            strict: default_strict(),
            missing_file: MissingFilePolicy::default(),
            arity_check: ArityCheck::default(),
        }
    }
}

impl ReadOptions {
    /// Parses options from TOML; absent keys keep their defaults.
    ///
    /// ```
    /// use dlpoly_io::io::{MissingFilePolicy, ReadOptions};
    ///
    /// let opts = ReadOptions::from_toml("strict = false\nmissing_file = \"default\"").unwrap();
    /// assert!(!opts.strict);
    /// assert_eq!(opts.missing_file, MissingFilePolicy::Default);
    /// ```
    pub fn from_toml(text: &str) -> Result<Self, Error> {
        Ok(toml::from_str(text)?)
    }

    pub fn permissive() -> Self {
        Self::default().with_strict(false)
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_missing_file(mut self, policy: MissingFilePolicy) -> Self {
        self.missing_file = policy;
        self
    }

    pub fn with_arity_check(mut self, check: ArityCheck) -> Self {
        self.arity_check = check;
        self
    }
}

/// A CONTROL file in either layout.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFile {
    /// Title line, directives, `finish`.
    Legacy(Control),
    /// `title` key followed by `key value... [unit]` lines.
    New(NewControl),
}

impl ControlFile {
    pub fn title(&self) -> &str {
        match self {
            ControlFile::Legacy(control) => &control.title,
            ControlFile::New(control) => control.title().unwrap_or_default(),
        }
    }

    /// The legacy record, as used for STATIS labelling.
    pub fn legacy(&self) -> Option<&Control> {
        match self {
            ControlFile::Legacy(control) => Some(control),
            ControlFile::New(_) => None,
        }
    }
}

impl From<Control> for ControlFile {
    fn from(control: Control) -> Self {
        ControlFile::Legacy(control)
    }
}

impl From<NewControl> for ControlFile {
    fn from(control: NewControl) -> Self {
        ControlFile::New(control)
    }
}

/// Opens `path`, or resolves it to `None` when it is missing and the policy
/// allows a default record.
fn open(path: &Path, format: Format, opts: &ReadOptions) -> Result<Option<BufReader<File>>, Error> {
    match File::open(path) {
        Ok(file) => Ok(Some(BufReader::new(file))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => match opts.missing_file {
            MissingFilePolicy::Error => Err(Error::MissingFile {
                format,
                path: path.to_path_buf(),
            }),
            MissingFilePolicy::Default => {
                warn!("{} file {} does not exist, using defaults", format, path.display());
                Ok(None)
            }
        },
        Err(e) => Err(e.into()),
    }
}

fn create(path: &Path) -> Result<BufWriter<File>, Error> {
    Ok(BufWriter::new(File::create(path)?))
}

/// Reads a CONTROL file, choosing the layout from its first line.
pub fn read_control(path: impl AsRef<Path>, opts: &ReadOptions) -> Result<ControlFile, Error> {
    let Some(mut reader) = open(path.as_ref(), Format::Control, opts)? else {
        return Ok(ControlFile::Legacy(Control::new(opts.arity_check)));
    };
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    if new_control::is_new_control(&text) {
        new_control::read(Cursor::new(text), opts).map(ControlFile::New)
    } else {
        control::read(Cursor::new(text), opts).map(ControlFile::Legacy)
    }
}

pub fn read_field(path: impl AsRef<Path>, opts: &ReadOptions) -> Result<Field, Error> {
    match open(path.as_ref(), Format::Field, opts)? {
        Some(reader) => field::read(reader, opts),
        None => Ok(Field::default()),
    }
}

pub fn read_config(path: impl AsRef<Path>, opts: &ReadOptions) -> Result<Config, Error> {
    match open(path.as_ref(), Format::Config, opts)? {
        Some(reader) => config::read(reader),
        None => Ok(Config::default()),
    }
}

/// Reads a STATIS file, labelling its columns from the run's CONTROL and
/// CONFIG when given.
pub fn read_statis(
    path: impl AsRef<Path>,
    opts: &ReadOptions,
    control: Option<&Control>,
    config: Option<&Config>,
) -> Result<Statis, Error> {
    match open(path.as_ref(), Format::Statis, opts)? {
        Some(reader) => statis::read(reader, control, config),
        None => Ok(Statis::default()),
    }
}

pub fn read_rdf(path: impl AsRef<Path>, opts: &ReadOptions) -> Result<Rdf, Error> {
    match open(path.as_ref(), Format::Rdf, opts)? {
        Some(reader) => rdf::read(reader),
        None => Ok(Rdf::default()),
    }
}

pub fn read_msd(path: impl AsRef<Path>, opts: &ReadOptions) -> Result<Msd, Error> {
    match open(path.as_ref(), Format::Msd, opts)? {
        Some(reader) => msd::read(reader),
        None => Ok(Msd::default()),
    }
}

pub fn write_control(path: impl AsRef<Path>, value: &ControlFile) -> Result<(), Error> {
    let mut writer = create(path.as_ref())?;
    match value {
        ControlFile::Legacy(control) => control::write(&mut writer, control)?,
        ControlFile::New(control) => new_control::write(&mut writer, control)?,
    }
    writer.flush()?;
    Ok(())
}

pub fn write_field(path: impl AsRef<Path>, value: &Field) -> Result<(), Error> {
    let mut writer = create(path.as_ref())?;
    field::write(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

pub fn write_config(path: impl AsRef<Path>, value: &Config) -> Result<(), Error> {
    let mut writer = create(path.as_ref())?;
    config::write(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}
