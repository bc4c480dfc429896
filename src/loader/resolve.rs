//! Module-name to archive-entry resolution.
//!
//! A dotted module name maps to up to four candidate entries inside the
//! archive: the package forms (`name/__init__` with the compiled or source
//! suffix) and the plain-module forms (`name` with either suffix). Package
//! forms always outrank plain-module forms; within a form the compiled
//! suffix wins unless the host prefers source. The orderings are two fixed
//! tables selected by an enum, never mutated.

use std::path::MAIN_SEPARATOR;

use crate::host::SuffixPreference;
use crate::zip::ArchiveDirectory;

pub const SOURCE_SUFFIX: &str = ".py";
pub const COMPILED_SUFFIX: &str = ".pyc";
pub const PACKAGE_STEM: &str = "__init__";

/// One shape a module can take inside the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateForm {
    PackagePrecompiled,
    PackageSource,
    ModulePrecompiled,
    ModuleSource,
}

impl CandidateForm {
    pub fn is_package(self) -> bool {
        matches!(
            self,
            CandidateForm::PackagePrecompiled | CandidateForm::PackageSource
        )
    }

    pub fn is_precompiled(self) -> bool {
        matches!(
            self,
            CandidateForm::PackagePrecompiled | CandidateForm::ModulePrecompiled
        )
    }

    /// Entry name this form occupies for a module at `module_path`
    /// (archive-relative, separator-normalized, no suffix).
    pub fn entry_name(self, module_path: &str) -> String {
        let suffix = if self.is_precompiled() {
            COMPILED_SUFFIX
        } else {
            SOURCE_SUFFIX
        };
        if self.is_package() {
            format!("{module_path}{MAIN_SEPARATOR}{PACKAGE_STEM}{suffix}")
        } else {
            format!("{module_path}{suffix}")
        }
    }

    /// The same form with the source suffix; used to locate the sibling a
    /// compiled entry's timestamp is checked against.
    pub fn source_sibling(self) -> CandidateForm {
        if self.is_package() {
            CandidateForm::PackageSource
        } else {
            CandidateForm::ModuleSource
        }
    }
}

const ORDER_COMPILED_FIRST: [CandidateForm; 4] = [
    CandidateForm::PackagePrecompiled,
    CandidateForm::PackageSource,
    CandidateForm::ModulePrecompiled,
    CandidateForm::ModuleSource,
];

const ORDER_SOURCE_FIRST: [CandidateForm; 4] = [
    CandidateForm::PackageSource,
    CandidateForm::PackagePrecompiled,
    CandidateForm::ModuleSource,
    CandidateForm::ModulePrecompiled,
];

/// The search order for the given preference. Order is part of the
/// observable contract.
pub fn search_order(preference: SuffixPreference) -> &'static [CandidateForm; 4] {
    match preference {
        SuffixPreference::CompiledFirst => &ORDER_COMPILED_FIRST,
        SuffixPreference::SourceFirst => &ORDER_SOURCE_FIRST,
    }
}

/// Archive-relative path for a dotted module name under this importer's
/// prefix. Only the final component matters; parent packages are addressed
/// by their own importer prefix.
pub fn module_relative_path(prefix: &str, fullname: &str) -> String {
    let tail = fullname.rsplit('.').next().unwrap_or(fullname);
    format!("{prefix}{tail}")
}

/// First form (in preference order) that exists in the directory.
pub fn find_candidate(
    directory: &ArchiveDirectory,
    module_path: &str,
    preference: SuffixPreference,
) -> Option<(CandidateForm, String)> {
    for &form in search_order(preference) {
        let entry_name = form.entry_name(module_path);
        if directory.contains(&entry_name) {
            return Some((form, entry_name));
        }
    }
    None
}

/// Whether `module_path` names a directory inside the archive: a possible
/// namespace-package portion when no module or package form matches.
pub fn is_directory(directory: &ArchiveDirectory, module_path: &str) -> bool {
    directory.contains(&format!("{module_path}{MAIN_SEPARATOR}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_names_per_form() {
        assert_eq!(
            CandidateForm::PackagePrecompiled.entry_name("pkg"),
            format!("pkg{MAIN_SEPARATOR}__init__.pyc")
        );
        assert_eq!(
            CandidateForm::PackageSource.entry_name("pkg"),
            format!("pkg{MAIN_SEPARATOR}__init__.py")
        );
        assert_eq!(CandidateForm::ModulePrecompiled.entry_name("mod"), "mod.pyc");
        assert_eq!(CandidateForm::ModuleSource.entry_name("mod"), "mod.py");
    }

    #[test]
    fn package_forms_outrank_module_forms_in_both_orders() {
        for pref in [SuffixPreference::CompiledFirst, SuffixPreference::SourceFirst] {
            let order = search_order(pref);
            let first_module = order.iter().position(|f| !f.is_package()).unwrap();
            assert!(order[..first_module].iter().all(|f| f.is_package()));
        }
    }

    #[test]
    fn preference_flips_suffix_order_only() {
        let compiled = search_order(SuffixPreference::CompiledFirst);
        assert!(compiled[0].is_precompiled() && compiled[2].is_precompiled());
        let source = search_order(SuffixPreference::SourceFirst);
        assert!(!source[0].is_precompiled() && !source[2].is_precompiled());
    }

    #[test]
    fn relative_path_uses_last_component() {
        assert_eq!(module_relative_path("", "a.b.c"), "c");
        assert_eq!(module_relative_path("lib/", "a.b"), "lib/b");
        assert_eq!(module_relative_path("", "top"), "top");
    }

    #[test]
    fn source_sibling_preserves_packageness() {
        assert_eq!(
            CandidateForm::PackagePrecompiled.source_sibling(),
            CandidateForm::PackageSource
        );
        assert_eq!(
            CandidateForm::ModulePrecompiled.source_sibling(),
            CandidateForm::ModuleSource
        );
    }
}
