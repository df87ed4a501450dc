//! Error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building or validating Gerber/Excellon
/// output. These are data-shape errors (bad coordinate formats, malformed
/// macros); geometry degeneracy is logged and skipped rather than raised
/// here, and I/O failures get their own variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GerberError {
    #[error("conversion error: {0}")]
    ConversionError(String),

    #[error("coordinate format error: {0}")]
    CoordinateFormatError(String),

    #[error("coordinates must have at least one of x or y set")]
    EmptyCoordinates,

    #[error("aperture macro error: {0}")]
    MacroError(String),
}

/// I/O failure writing a generated file to disk. Kept distinct from
/// [`GerberError`] because it carries a path and is always recoverable,
/// never silently downgraded to a warning.
#[derive(Error, Debug)]
#[error("failed to write {path}: {source}")]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

pub type GerberResult<T> = Result<T, GerberError>;
pub type WriteResult<T> = Result<T, WriteError>;
