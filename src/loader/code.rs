//! Turning a resolved entry into executable code.
//!
//! A precompiled entry is trusted only when its 16-byte header checks out:
//! the magic must match the host runtime's, hash-based units are gated by
//! the host's policy, and timestamp-based units must agree with the source
//! sibling's archive mtime to within one second. A header that fails any of
//! these is a soft signal to keep walking the search order, distinct from
//! the hard failure of deserializing something that is not code.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Result, ZipImportError};
use crate::host::{HashPolicy, HostRuntime, UnmarshalOutcome};
use crate::zip::{ArchiveDirectory, get_entry_data};

use super::resolve::{CandidateForm, find_candidate, module_relative_path};

/// Size of the precompiled-unit header: magic, flags, timestamp-or-hash,
/// source size. All little-endian u32.
const BYTECODE_HEADER_SIZE: usize = 16;

/// Flag bit marking a hash-validated unit instead of a timestamp one.
const FLAG_HASH_BASED: u32 = 0x1;

/// Outcome of validating one precompiled entry.
///
/// `Stale` and `BadMagic` both mean "keep trying"; they are separate so
/// callers and tests can tell a version mismatch from an outdated build.
pub enum BytecodeOutcome<C> {
    Usable(C),
    Stale,
    BadMagic,
}

/// A module's code together with what the facade reports about it.
pub struct LoadedModule<C> {
    pub code: C,
    pub is_package: bool,
    /// Archive-relative entry the code came from.
    pub entry_name: String,
    /// Archive-qualified path for `__file__`-style diagnostics.
    pub display_path: String,
}

/// Validate a precompiled entry's header and deserialize its body.
///
/// `source_mtime` is the source sibling's archive mtime, or `None` when no
/// sibling exists (the timestamp check is skipped then).
///
/// An entry shorter than the 16-byte header is classified `BadMagic`, not
/// an error: like any other header-validation failure it falls through to
/// the source sibling.
pub fn classify_bytecode<R: HostRuntime>(
    runtime: &R,
    module_name: &str,
    data: &[u8],
    source_mtime: Option<i64>,
) -> Result<BytecodeOutcome<R::Code>> {
    if data.len() < BYTECODE_HEADER_SIZE || data[0..4] != runtime.magic() {
        return Ok(BytecodeOutcome::BadMagic);
    }

    let flags = LittleEndian::read_u32(&data[4..8]);
    if flags & FLAG_HASH_BASED != 0 {
        // No hash is actually checked; a permissive host accepts the unit
        // outright, a strict one treats it like a magic mismatch.
        if runtime.hash_policy() != HashPolicy::Permissive {
            return Ok(BytecodeOutcome::BadMagic);
        }
    } else if let Some(mtime) = source_mtime {
        let timestamp = LittleEndian::read_u32(&data[8..12]) as i64;
        if (timestamp - mtime).abs() > 1 {
            return Ok(BytecodeOutcome::Stale);
        }
    }

    match runtime.unmarshal(&data[BYTECODE_HEADER_SIZE..])? {
        UnmarshalOutcome::Code(code) => Ok(BytecodeOutcome::Usable(code)),
        UnmarshalOutcome::NotCode => Err(ZipImportError::NotACodeUnit {
            name: module_name.to_string(),
        }),
    }
}

/// Convert source bytes to `\n`-only line endings before compilation.
pub fn normalize_newlines(source: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(source.len());
    let mut i = 0;
    while i < source.len() {
        match source[i] {
            b'\r' => {
                out.push(b'\n');
                if source.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    out
}

/// Walk the search order for `fullname` and produce its code.
///
/// Compiled candidates that fail header validation fall through to the next
/// form; only exhausting every candidate is a missing module. Collaborator
/// failures and post-unmarshal type mismatches propagate immediately.
pub fn load_module<R: HostRuntime>(
    runtime: &R,
    directory: &ArchiveDirectory,
    prefix: &str,
    fullname: &str,
) -> Result<LoadedModule<R::Code>> {
    let module_path = module_relative_path(prefix, fullname);

    for &form in super::resolve::search_order(runtime.suffix_preference()) {
        let entry_name = form.entry_name(&module_path);
        let Some(entry) = directory.get(&entry_name) else {
            continue;
        };
        let display_path = entry.display_path.clone();
        let data = get_entry_data(directory, &entry_name)?;

        if form.is_precompiled() {
            let source_mtime = directory
                .get(&form.source_sibling().entry_name(&module_path))
                .map(|sibling| sibling.mtime());
            match classify_bytecode(runtime, fullname, &data, source_mtime)? {
                BytecodeOutcome::Usable(code) => {
                    return Ok(LoadedModule {
                        code,
                        is_package: form.is_package(),
                        entry_name,
                        display_path,
                    });
                }
                BytecodeOutcome::Stale | BytecodeOutcome::BadMagic => continue,
            }
        } else {
            let source = normalize_newlines(&data);
            let code = runtime.compile(&source, &display_path)?;
            return Ok(LoadedModule {
                code,
                is_package: form.is_package(),
                entry_name,
                display_path,
            });
        }
    }

    Err(ZipImportError::ModuleNotFound {
        name: fullname.to_string(),
    })
}

/// Locate the retrievable source entry for `fullname`, if any.
///
/// A module that resolves only to a precompiled form has no source; that is
/// a `None`, not an error. An unresolvable name is an error.
pub fn find_source_entry<R: HostRuntime>(
    runtime: &R,
    directory: &ArchiveDirectory,
    prefix: &str,
    fullname: &str,
) -> Result<Option<String>> {
    let module_path = module_relative_path(prefix, fullname);
    let (form, _) = find_candidate(directory, &module_path, runtime.suffix_preference())
        .ok_or_else(|| ZipImportError::ModuleNotFound {
            name: fullname.to_string(),
        })?;

    let source_form = if form.is_package() {
        CandidateForm::PackageSource
    } else {
        CandidateForm::ModuleSource
    };
    let source_name = source_form.entry_name(&module_path);
    Ok(directory.contains(&source_name).then_some(source_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newline_normalization() {
        assert_eq!(normalize_newlines(b"a\r\nb\rc\nd"), b"a\nb\nc\nd");
        assert_eq!(normalize_newlines(b"\r\r\n"), b"\n\n");
        assert_eq!(normalize_newlines(b"plain"), b"plain");
    }

    #[test]
    fn trailing_cr_is_normalized() {
        assert_eq!(normalize_newlines(b"x=1\r"), b"x=1\n");
    }
}
