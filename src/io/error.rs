use super::Format;
use crate::model::control::DirectiveError;
use crate::model::ensemble::EnsembleError;
use crate::model::schema::SchemaViolation;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("{format} file not found: {}", path.display())]
    MissingFile { format: Format, path: PathBuf },

    #[error("failed to parse {format} data: {details} (at line ~{line})")]
    Parse {
        format: Format,
        line: usize,
        details: String,
    },

    #[error("malformed {format} record at line {line}: expected {expected}, found {found}")]
    MalformedRecord {
        format: Format,
        line: usize,
        expected: String,
        found: String,
    },

    #[error("unrecognized {format} block '{keyword}' at line {line}")]
    UnrecognizedBlock {
        format: Format,
        line: usize,
        keyword: String,
    },

    #[error("invalid value: {0}")]
    Schema(#[from] SchemaViolation),

    #[error("invalid ensemble: {0}")]
    Ensemble(#[from] EnsembleError),

    #[error("invalid read options: {0}")]
    Options(#[from] toml::de::Error),
}

impl From<DirectiveError> for Error {
    fn from(e: DirectiveError) -> Self {
        match e {
            DirectiveError::Schema(v) => Error::Schema(v),
            DirectiveError::Ensemble(v) => Error::Ensemble(v),
            DirectiveError::Unrecognized(keyword) => Error::UnrecognizedBlock {
                format: Format::Control,
                line: 0,
                keyword,
            },
        }
    }
}

impl Error {
    pub fn parse(format: Format, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            format,
            line,
            details: details.into(),
        }
    }

    pub fn malformed(
        format: Format,
        line: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::MalformedRecord {
            format,
            line,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unrecognized(format: Format, line: usize, keyword: impl Into<String>) -> Self {
        Self::UnrecognizedBlock {
            format,
            line,
            keyword: keyword.into(),
        }
    }

    /// Fills in the line number of an unrecognized-keyword error.
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            Error::UnrecognizedBlock {
                format, keyword, ..
            } => Error::UnrecognizedBlock {
                format,
                line,
                keyword,
            },
            other => other,
        }
    }
}
