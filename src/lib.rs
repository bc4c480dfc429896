//! # zipmod
//!
//! An archive-backed module loader: resolves dotted module names to entries
//! inside a ZIP archive, parses the archive's central directory without any
//! ZIP library, decompresses and validates stored bytecode or source, and
//! hands the host runtime an executable code unit.
//!
//! The host runtime stays opaque behind the [`HostRuntime`] trait: this
//! crate never compiles source or deserializes bytecode itself, it only
//! decides *which* entry wins for a name and *whether* a precompiled entry
//! can be trusted.
//!
//! ## Features
//!
//! - Hand-rolled central-directory parser (EOCD, CDFH, LFH) for STORED and
//!   DEFLATE entries
//! - Offset correction for self-extracting archives with prepended bytes
//! - Process-wide directory cache, one parse per archive path
//! - Fixed package/module, compiled/source search order with a
//!   source-first switch
//! - Bytecode magic/flag/timestamp validation with silent source fallback
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use zipmod::{FindResult, HostRuntime, UnmarshalOutcome, ZipImporter};
//!
//! struct MyRuntime;
//!
//! impl HostRuntime for MyRuntime {
//!     type Code = Vec<u8>;
//!
//!     fn compile(&self, source: &[u8], _display_path: &str) -> anyhow::Result<Self::Code> {
//!         Ok(source.to_vec())
//!     }
//!
//!     fn unmarshal(&self, data: &[u8]) -> anyhow::Result<UnmarshalOutcome<Self::Code>> {
//!         Ok(UnmarshalOutcome::Code(data.to_vec()))
//!     }
//!
//!     fn magic(&self) -> [u8; 4] {
//!         *b"RT01"
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let importer = ZipImporter::new(MyRuntime, Path::new("lib.zip"))?;
//!     if let FindResult::Module { is_package } = importer.find("pkg") {
//!         let code = importer.get_code("pkg")?;
//!         println!("package: {is_package}, {} code bytes", code.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod host;
pub mod loader;
pub mod zip;

pub use cli::Cli;
pub use error::{Result, ZipImportError};
pub use host::{HashPolicy, HostRuntime, SuffixPreference, UnmarshalOutcome};
pub use loader::{FindResult, ZipImporter};
pub use zip::{ArchiveDirectory, DirectoryCache, ZipEntry};
