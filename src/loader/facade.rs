//! The importer object the host module system talks to.
//!
//! One `ZipImporter` serves one archive path plus an optional subdirectory
//! prefix inside it. Construction populates the shared directory cache;
//! everything afterwards is lookups against the immutable snapshot plus
//! short-lived data reads.

use std::fmt;
use std::io;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::sync::Arc;

use crate::error::{Result, ZipImportError};
use crate::host::HostRuntime;
use crate::zip::{ArchiveDirectory, DirectoryCache, get_entry_data};

use super::code::{load_module, normalize_newlines};
use super::resolve::{find_candidate, is_directory, module_relative_path};

/// What `find` learned about a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindResult {
    /// A loadable module or package exists for the name.
    Module { is_package: bool },
    /// No module entry, but the name matches a directory in the archive:
    /// a possible namespace-package portion, reported by path.
    NamespacePortion(String),
    NotFound,
}

/// Archive-backed module loader rooted at one archive (and optionally a
/// subdirectory inside it).
pub struct ZipImporter<R: HostRuntime> {
    runtime: R,
    archive_path: PathBuf,
    /// Archive-relative subdirectory, empty or separator-terminated.
    prefix: String,
    directory: Arc<ArchiveDirectory>,
}

// Manual impl: the runtime is opaque and need not be Debug.
impl<R: HostRuntime> fmt::Debug for ZipImporter<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipImporter")
            .field("archive_path", &self.archive_path)
            .field("prefix", &self.prefix)
            .field("entries", &self.directory.len())
            .finish_non_exhaustive()
    }
}

impl<R: HostRuntime> ZipImporter<R> {
    /// Importer rooted at the top of `archive_path`.
    pub fn new(runtime: R, archive_path: &Path) -> Result<Self> {
        Self::with_prefix(runtime, archive_path, "")
    }

    /// Importer rooted at `prefix` inside `archive_path`.
    pub fn with_prefix(runtime: R, archive_path: &Path, prefix: &str) -> Result<Self> {
        let directory = DirectoryCache::global().get_or_read(archive_path)?;
        let mut prefix = prefix.to_string();
        if !prefix.is_empty() && !prefix.ends_with(MAIN_SEPARATOR) {
            prefix.push(MAIN_SEPARATOR);
        }
        Ok(Self {
            runtime,
            archive_path: archive_path.to_path_buf(),
            prefix,
            directory,
        })
    }

    /// Importer for a module-search-path entry that points at an archive
    /// or at a directory inside one (`lib.zip/sub/dir`). Walks the path
    /// upward until an existing regular file is found; the remainder
    /// becomes the prefix.
    pub fn from_path_entry(runtime: R, path_entry: &Path) -> Result<Self> {
        let mut archive = path_entry.to_path_buf();
        loop {
            if archive.is_file() {
                break;
            }
            if !archive.pop() || archive.as_os_str().is_empty() {
                return Err(ZipImportError::ArchiveOpen {
                    path: path_entry.to_path_buf(),
                    source: io::Error::from(io::ErrorKind::NotFound),
                });
            }
        }

        let prefix = path_entry
            .strip_prefix(&archive)
            .map(|rest| rest.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::with_prefix(runtime, &archive, &prefix)
    }

    /// Path of the backing archive.
    pub fn archive(&self) -> &Path {
        &self.archive_path
    }

    /// Subdirectory inside the archive this importer is rooted at (empty
    /// or separator-terminated).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The parsed directory snapshot backing this importer.
    pub fn directory(&self) -> &ArchiveDirectory {
        &self.directory
    }

    /// Classify `fullname` without materializing any code.
    pub fn find(&self, fullname: &str) -> FindResult {
        let module_path = module_relative_path(&self.prefix, fullname);
        if let Some((form, _)) =
            find_candidate(&self.directory, &module_path, self.runtime.suffix_preference())
        {
            return FindResult::Module {
                is_package: form.is_package(),
            };
        }
        if is_directory(&self.directory, &module_path) {
            let portion = format!(
                "{}{}{}",
                self.archive_path.display(),
                MAIN_SEPARATOR,
                module_path
            );
            return FindResult::NamespacePortion(portion);
        }
        FindResult::NotFound
    }

    /// Produce the executable code unit for `fullname`.
    pub fn get_code(&self, fullname: &str) -> Result<R::Code> {
        load_module(&self.runtime, &self.directory, &self.prefix, fullname).map(|m| m.code)
    }

    /// The module's source text, or `None` when it exists only precompiled.
    pub fn get_source(&self, fullname: &str) -> Result<Option<String>> {
        let entry_name = super::code::find_source_entry(
            &self.runtime,
            &self.directory,
            &self.prefix,
            fullname,
        )?;
        match entry_name {
            Some(name) => {
                let data = get_entry_data(&self.directory, &name)?;
                let text = String::from_utf8_lossy(&normalize_newlines(&data)).into_owned();
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    /// Raw data for an archive path, as stored (decompressed). Accepts
    /// either an archive-relative entry name or a full path beginning with
    /// the archive path.
    pub fn get_data(&self, path: &str) -> Result<Vec<u8>> {
        let archive_prefix = format!("{}{}", self.archive_path.display(), MAIN_SEPARATOR);
        let key = path.strip_prefix(&archive_prefix).unwrap_or(path);
        get_entry_data(&self.directory, key)
    }

    /// Whether `fullname` resolves to a package.
    pub fn is_package(&self, fullname: &str) -> Result<bool> {
        let module_path = module_relative_path(&self.prefix, fullname);
        find_candidate(&self.directory, &module_path, self.runtime.suffix_preference())
            .map(|(form, _)| form.is_package())
            .ok_or_else(|| ZipImportError::ModuleNotFound {
                name: fullname.to_string(),
            })
    }
}
