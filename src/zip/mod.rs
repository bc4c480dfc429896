//! ZIP archive access.
//!
//! This module owns everything that touches the archive format itself:
//!
//! - [`structures`]: wire-level constants and records (EOCD, header
//!   signatures, DOS timestamps, entry descriptors)
//! - [`directory`]: one-pass central-directory parsing with prefix-offset
//!   correction
//! - [`cache`]: the process-wide parsed-directory cache
//! - [`data`]: per-entry local-header validation, reads and inflation
//!
//! ## Format notes
//!
//! Field widths, offsets and the `PK\x05\x06` / `PK\x01\x02` / `PK\x03\x04`
//! signatures follow the PKZIP APPNOTE layouts byte for byte. Supported
//! compression methods are STORED and DEFLATE; ZIP64, multi-disk and
//! encrypted archives are out of scope, as are archives with trailing
//! comments (the EOCD must be the last 22 bytes).

mod cache;
mod data;
mod directory;
mod structures;

pub use cache::DirectoryCache;
pub use data::get_entry_data;
pub use directory::{ArchiveDirectory, read_directory};
pub use structures::*;
