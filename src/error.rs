//! Start-up errors
//!
//! Everything that can go wrong before a trace session exists: missing
//! files, malformed addresses, images that do not fit, and listings that
//! cannot be indexed. Runtime faults use their own types
//! ([`MemoryError`], [`QueryError`](crate::QueryError)).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::listing::ListingError;
use crate::memory::MemoryError;

/// Errors raised while assembling a session from its inputs.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An input path does not exist.
    #[error("{} doesn't exist", .path.display())]
    MissingFile { path: PathBuf },

    /// An input file exists but could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Address text is not a 16-bit number.
    #[error("invalid address '{text}': {reason}")]
    InvalidAddress { text: String, reason: String },

    /// A binary image holds no bytes.
    #[error("image {name} is empty")]
    EmptyImage { name: String },

    /// A binary image runs past `$FFFF`.
    #[error("image {name} ({length} bytes at ${address:04X}) runs past $FFFF")]
    ImageTooLarge {
        name: String,
        address: u16,
        length: usize,
    },

    /// Two binary images share at least one address.
    #[error("image {name} at ${address:04X} overlaps image {other} at ${other_address:04X}")]
    ImageOverlap {
        name: String,
        address: u16,
        other: String,
        other_address: u16,
    },

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Listing(#[from] ListingError),
}

impl ConfigError {
    /// Wraps an I/O error, reporting a missing file as `MissingFile`.
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::MissingFile { path }
        } else {
            ConfigError::Io { path, source }
        }
    }
}
