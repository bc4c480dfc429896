//! Main entry point for the zipmod CLI.
//!
//! This binary inspects ZIP archives the way a host runtime would consume
//! them: listing importable entries, resolving dotted module names through
//! the real search order, and dumping entry data. It installs a stub
//! runtime that never materializes code, so everything here works without
//! a compiler or deserializer attached.

use anyhow::{Result, bail};
use clap::Parser;
use std::io::Write;
use std::path::Path;

use zipmod::host::{HostRuntime, SuffixPreference, UnmarshalOutcome};
use zipmod::{Cli, FindResult, ZipImporter};

/// Runtime stub for inspection: resolution and data access only.
struct InspectRuntime {
    prefer_source: bool,
}

impl HostRuntime for InspectRuntime {
    type Code = ();

    fn compile(&self, _source: &[u8], display_path: &str) -> Result<()> {
        bail!("zipmod cannot compile {display_path}: no runtime attached")
    }

    fn unmarshal(&self, _data: &[u8]) -> Result<UnmarshalOutcome<()>> {
        Ok(UnmarshalOutcome::NotCode)
    }

    fn magic(&self) -> [u8; 4] {
        // No real runtime magic; nothing validates against it here.
        [0; 4]
    }

    fn suffix_preference(&self) -> SuffixPreference {
        if self.prefer_source {
            SuffixPreference::SourceFirst
        } else {
            SuffixPreference::CompiledFirst
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let runtime = InspectRuntime {
        prefer_source: cli.prefer_source,
    };
    let importer = ZipImporter::from_path_entry(runtime, Path::new(&cli.path))?;

    // List mode: display archive contents and exit
    if cli.list || cli.verbose {
        return list_entries(&importer, cli.verbose);
    }

    if let Some(entry) = &cli.pipe {
        let data = importer.get_data(entry)?;
        std::io::stdout().write_all(&data)?;
        return Ok(());
    }

    if !cli.find.is_empty() {
        for name in &cli.find {
            match importer.find(name) {
                FindResult::Module { is_package } => {
                    let kind = if is_package { "package" } else { "module" };
                    println!("{name}: {kind}");
                }
                FindResult::NamespacePortion(path) => {
                    println!("{name}: namespace portion at {path}");
                }
                FindResult::NotFound => println!("{name}: not found"),
            }
        }
        return Ok(());
    }

    // Default to listing, like the archive tools this replaces.
    list_entries(&importer, false)
}

/// Print the archive's entries, roughly in `unzip -l` shape.
fn list_entries(importer: &ZipImporter<InspectRuntime>, verbose: bool) -> Result<()> {
    let mut entries: Vec<_> = importer.directory().entries().collect();
    entries.sort_unstable_by_key(|(name, _)| *name);

    if verbose {
        println!(
            "{:>10}  {:>10}  {:<8}  {:<16}  Name",
            "Size", "Packed", "Method", "Modified"
        );
        println!("{:->10}  {:->10}  {:-<8}  {:-<16}  ----", "", "", "", "");
    }

    let mut total: u64 = 0;
    for (name, entry) in &entries {
        total += entry.uncompressed_size as u64;
        if verbose {
            let method = match entry.compression_method {
                zipmod::zip::CompressionMethod::Stored => "Stored",
                zipmod::zip::CompressionMethod::Deflate => "Defl",
                zipmod::zip::CompressionMethod::Unknown(_) => "Unknown",
            };
            println!(
                "{:>10}  {:>10}  {:<8}  {:<16}  {}",
                entry.uncompressed_size,
                entry.compressed_size,
                method,
                dos_stamp(entry),
                name
            );
        } else {
            println!("{name}");
        }
    }

    if verbose {
        println!("{:->10}  {:->10}", "", "");
        println!("{:>10}  {} entries", total, entries.len());
    }
    Ok(())
}

/// Render an entry's DOS date/time fields as `YYYY-MM-DD hh:mm`.
fn dos_stamp(entry: &zipmod::ZipEntry) -> String {
    let (d, t) = (entry.mod_date, entry.mod_time);
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}",
        ((d >> 9) & 0x7f) + 1980,
        (d >> 5) & 0x0f,
        d & 0x1f,
        (t >> 11) & 0x1f,
        (t >> 5) & 0x3f
    )
}
