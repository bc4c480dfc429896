//! Module resolution and code materialization on top of a parsed archive.
//!
//! - [`resolve`]: the fixed search order mapping dotted names to candidate
//!   entries, and namespace-portion detection
//! - [`code`]: precompiled-header validation with source fallback
//! - [`facade`]: the [`ZipImporter`] object hosts register against ZIP
//!   path entries

mod code;
mod facade;
mod resolve;

pub use code::{BytecodeOutcome, LoadedModule, classify_bytecode, normalize_newlines};
pub use facade::{FindResult, ZipImporter};
pub use resolve::{
    COMPILED_SUFFIX, CandidateForm, PACKAGE_STEM, SOURCE_SUFFIX, module_relative_path,
    search_order,
};
