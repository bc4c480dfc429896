//! Typed error taxonomy for the loader.
//!
//! Structural archive failures are permanent and surfaced immediately; the
//! two "not found" variants are ordinary negative results the host import
//! machinery is expected to handle by moving on to its next path entry.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Every failure the loader can surface to a caller.
#[derive(Debug, Error)]
pub enum ZipImportError {
    /// The archive file could not be opened at all.
    #[error("can't open Zip file: {path}")]
    ArchiveOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but carries no End-Of-Central-Directory record.
    #[error("not a Zip file: {path}")]
    NotAZipFile { path: PathBuf },

    /// EOCD fields are internally inconsistent (corrupt or adversarial).
    #[error("bad central directory in {path}")]
    BadCentralDirectory { path: PathBuf },

    /// A record was cut short while parsing the central directory or an
    /// entry's local header.
    #[error("unexpected end of archive: {path}")]
    UnexpectedEof { path: PathBuf },

    /// I/O failed mid-parse for a reason other than hitting end of file.
    #[error("error reading Zip file: {path}")]
    ArchiveRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A central-directory entry claims its local header starts inside or
    /// after the central directory itself.
    #[error("bad local header offset for {entry} in {path}")]
    BadLocalHeaderOffset { path: PathBuf, entry: String },

    /// The bytes at an entry's recorded offset are not a local file header.
    #[error("bad local file header for {entry} in {path}")]
    BadLocalFileHeader { path: PathBuf, entry: String },

    /// Fewer data bytes were present than the directory promised.
    #[error("truncated data for {entry} in {path}")]
    TruncatedEntry { path: PathBuf, entry: String },

    /// The directory records a size no read could satisfy.
    #[error("invalid size {size} for {entry} in {path}")]
    InvalidEntrySize {
        path: PathBuf,
        entry: String,
        size: u64,
    },

    /// The entry uses a compression method this loader cannot inflate.
    #[error("unsupported compression method {method} for {entry} in {path}")]
    UnsupportedCompression {
        path: PathBuf,
        entry: String,
        method: u16,
    },

    /// Raw-DEFLATE decompression failed on the entry's data.
    #[error("can't decompress data for {entry} in {path}")]
    Decompress {
        path: PathBuf,
        entry: String,
        #[source]
        source: io::Error,
    },

    /// `get_data` was asked for a path that is not in this archive.
    #[error("{name} not found in {path}")]
    EntryNotFound { path: PathBuf, name: String },

    /// No candidate entry matched the module name. The host tries its next
    /// path entry on this; it is not a structural failure.
    #[error("can't find module {name}")]
    ModuleNotFound { name: String },

    /// `unmarshal` succeeded but produced something other than a code unit.
    /// This is a hard incompatibility, never retried with a source fallback.
    #[error("compiled module {name} is not a code object")]
    NotACodeUnit { name: String },

    /// A host collaborator (`compile`, `unmarshal`) failed.
    #[error(transparent)]
    Host(#[from] anyhow::Error),
}

impl ZipImportError {
    /// True for the negative-result variants a host import mechanism
    /// recovers from by consulting its next path entry.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ZipImportError::EntryNotFound { .. } | ZipImportError::ModuleNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ZipImportError>;
