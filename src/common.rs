use std::error;
use std::fmt;
use std::io;
use std::result;

/// An error that occurred when generating section accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while writing the generated code.
    Io,
    /// A section identifier was empty.
    EmptyIdentifier,
    /// A section identifier contained characters that cannot appear in a
    /// Rust identifier.
    InvalidIdentifier(String),
    /// The same section was listed more than once.
    DuplicateSection(String),
    /// The section has no corresponding `gimli` section type.
    UnknownSection(String),
    /// Two generated items would have the same name.
    NameCollision(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> result::Result<(), fmt::Error> {
        match *self {
            Error::Io => write!(f, "An I/O error occurred while writing."),
            Error::EmptyIdentifier => write!(f, "A section identifier was empty."),
            Error::InvalidIdentifier(ref name) => {
                write!(f, "Invalid section identifier: {:?}", name)
            }
            Error::DuplicateSection(ref name) => {
                write!(f, "Section listed more than once: {}", name)
            }
            Error::UnknownSection(ref name) => {
                write!(f, "No gimli section type for .debug_{}", name)
            }
            Error::NameCollision(ref name) => {
                write!(f, "Generated name used more than once: {}", name)
            }
        }
    }
}

impl error::Error for Error {}

impl From<io::Error> for Error {
    fn from(_: io::Error) -> Self {
        Error::Io
    }
}

/// The result of generating code.
pub type Result<T> = result::Result<T, Error>;
