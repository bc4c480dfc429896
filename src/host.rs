//! The seam between the loader and its host runtime.
//!
//! The loader never looks inside a code unit, never compiles source itself
//! and never deserializes bytecode itself; it delegates all three to the
//! host through [`HostRuntime`] and only decides *whether* to trust a
//! precompiled entry and *when* to fall back to source.

use anyhow::Result;

/// What `unmarshal` produced.
///
/// Distinguishing "deserialized fine but it isn't code" from a
/// deserialization error matters: the former is a hard type error that must
/// not be retried with a source fallback, the latter propagates as-is.
pub enum UnmarshalOutcome<C> {
    /// A code unit of the kind the host can execute.
    Code(C),
    /// Deserialization succeeded but yielded some other kind of value.
    NotCode,
}

/// Whether hash-based precompiled units are trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashPolicy {
    /// Reject hash-based units; they fall through to source like a magic
    /// mismatch would.
    Strict,
    /// Accept hash-based units without checking the hash.
    Permissive,
}

/// Which suffix wins when both a compiled and a source form of a module
/// exist in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixPreference {
    CompiledFirst,
    SourceFirst,
}

/// Operations the host runtime supplies.
///
/// `Code` is fully opaque to the loader.
pub trait HostRuntime {
    type Code;

    /// Compile module source (newlines already normalized to `\n`) into a
    /// code unit. `display_path` is the archive-qualified path used for
    /// diagnostics.
    fn compile(&self, source: &[u8], display_path: &str) -> Result<Self::Code>;

    /// Deserialize a code unit from the bytes following the 16-byte
    /// precompiled-unit header.
    fn unmarshal(&self, data: &[u8]) -> Result<UnmarshalOutcome<Self::Code>>;

    /// Magic constant identifying the precompiled format this runtime
    /// accepts; compared against the first 4 bytes of every compiled entry.
    fn magic(&self) -> [u8; 4];

    fn hash_policy(&self) -> HashPolicy {
        HashPolicy::Strict
    }

    fn suffix_preference(&self) -> SuffixPreference {
        SuffixPreference::CompiledFirst
    }
}
