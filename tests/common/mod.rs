//! Test fixtures: a minimal byte-level ZIP writer and a mock host runtime.
//!
//! The writer emits exactly the records the loader parses (local file
//! headers, central directory, EOCD) so tests control every field,
//! including DOS timestamps and deliberately broken offsets.

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;
use std::path::Path;

use zipmod::host::{HashPolicy, HostRuntime, SuffixPreference, UnmarshalOutcome};

/// Default DOS date/time used for entries: 2024-06-15 12:30:40 UTC.
pub const DOS_DATE: u16 = (44 << 9) | (6 << 5) | 15;
pub const DOS_TIME: u16 = (12 << 11) | (30 << 5) | 20;
/// Unix seconds for [`DOS_DATE`]/[`DOS_TIME`].
pub const DOS_UNIX: i64 = 1718454640;

pub struct ZipEntrySpec {
    name: String,
    data: Vec<u8>,
    method: u16,
    stored: Vec<u8>,
    dos_time: u16,
    dos_date: u16,
}

#[derive(Default)]
pub struct ZipBuilder {
    entries: Vec<ZipEntrySpec>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a STORED entry with the default timestamp.
    pub fn entry(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push(ZipEntrySpec {
            name: name.to_string(),
            data: data.to_vec(),
            method: 0,
            stored: data.to_vec(),
            dos_time: DOS_TIME,
            dos_date: DOS_DATE,
        });
        self
    }

    /// Add a DEFLATE-compressed entry (raw deflate stream).
    pub fn entry_deflate(mut self, name: &str, data: &[u8]) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        let stored = encoder.finish().unwrap();
        self.entries.push(ZipEntrySpec {
            name: name.to_string(),
            data: data.to_vec(),
            method: 8,
            stored,
            dos_time: DOS_TIME,
            dos_date: DOS_DATE,
        });
        self
    }

    /// Add a STORED entry with explicit DOS date/time fields.
    pub fn entry_with_times(mut self, name: &str, data: &[u8], date: u16, time: u16) -> Self {
        self.entries.push(ZipEntrySpec {
            name: name.to_string(),
            data: data.to_vec(),
            method: 0,
            stored: data.to_vec(),
            dos_time: time,
            dos_date: date,
        });
        self
    }

    /// Add an entry with an unknown compression method id.
    pub fn entry_with_method(mut self, name: &str, data: &[u8], method: u16) -> Self {
        self.entries.push(ZipEntrySpec {
            name: name.to_string(),
            data: data.to_vec(),
            method,
            stored: data.to_vec(),
            dos_time: DOS_TIME,
            dos_date: DOS_DATE,
        });
        self
    }

    /// Add a directory marker entry (trailing slash, no data).
    pub fn dir(self, name: &str) -> Self {
        let name = format!("{}/", name.trim_end_matches('/'));
        self.entry(&name, b"")
    }

    /// Serialize the archive body: local headers, central directory, EOCD.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut locations = Vec::new();

        for spec in &self.entries {
            locations.push(out.len() as u32);
            write_local_header(&mut out, spec);
            out.extend_from_slice(&spec.stored);
        }

        let cd_offset = out.len() as u32;
        for (spec, &lho) in self.entries.iter().zip(&locations) {
            write_central_header(&mut out, spec, lho);
        }
        let cd_size = out.len() as u32 - cd_offset;

        write_eocd(&mut out, self.entries.len() as u16, cd_size, cd_offset);
        out
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.build()).unwrap();
    }

    /// Write the archive with `prefix` bytes prepended (self-extractor
    /// stub shape).
    pub fn write_prefixed(&self, path: &Path, prefix: &[u8]) {
        let mut bytes = prefix.to_vec();
        bytes.extend_from_slice(&self.build());
        std::fs::write(path, bytes).unwrap();
    }
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(data);
    crc.sum()
}

fn write_local_header(out: &mut Vec<u8>, spec: &ZipEntrySpec) {
    out.extend_from_slice(b"PK\x03\x04");
    out.write_u16::<LittleEndian>(20).unwrap(); // version needed
    out.write_u16::<LittleEndian>(0).unwrap(); // flags
    out.write_u16::<LittleEndian>(spec.method).unwrap();
    out.write_u16::<LittleEndian>(spec.dos_time).unwrap();
    out.write_u16::<LittleEndian>(spec.dos_date).unwrap();
    out.write_u32::<LittleEndian>(crc32(&spec.data)).unwrap();
    out.write_u32::<LittleEndian>(spec.stored.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(spec.data.len() as u32).unwrap();
    out.write_u16::<LittleEndian>(spec.name.len() as u16).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap(); // extra
    out.extend_from_slice(spec.name.as_bytes());
}

fn write_central_header(out: &mut Vec<u8>, spec: &ZipEntrySpec, lho: u32) {
    out.extend_from_slice(b"PK\x01\x02");
    out.write_u16::<LittleEndian>(20).unwrap(); // version made by
    out.write_u16::<LittleEndian>(20).unwrap(); // version needed
    out.write_u16::<LittleEndian>(0).unwrap(); // flags
    out.write_u16::<LittleEndian>(spec.method).unwrap();
    out.write_u16::<LittleEndian>(spec.dos_time).unwrap();
    out.write_u16::<LittleEndian>(spec.dos_date).unwrap();
    out.write_u32::<LittleEndian>(crc32(&spec.data)).unwrap();
    out.write_u32::<LittleEndian>(spec.stored.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(spec.data.len() as u32).unwrap();
    out.write_u16::<LittleEndian>(spec.name.len() as u16).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap(); // extra
    out.write_u16::<LittleEndian>(0).unwrap(); // comment
    out.write_u16::<LittleEndian>(0).unwrap(); // disk start
    out.write_u16::<LittleEndian>(0).unwrap(); // internal attrs
    out.write_u32::<LittleEndian>(0).unwrap(); // external attrs
    out.write_u32::<LittleEndian>(lho).unwrap();
    out.extend_from_slice(spec.name.as_bytes());
}

fn write_eocd(out: &mut Vec<u8>, count: u16, cd_size: u32, cd_offset: u32) {
    out.extend_from_slice(b"PK\x05\x06");
    out.write_u16::<LittleEndian>(0).unwrap(); // disk number
    out.write_u16::<LittleEndian>(0).unwrap(); // cd disk
    out.write_u16::<LittleEndian>(count).unwrap();
    out.write_u16::<LittleEndian>(count).unwrap();
    out.write_u32::<LittleEndian>(cd_size).unwrap();
    out.write_u32::<LittleEndian>(cd_offset).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap(); // comment
}

/// Magic constant the mock runtime accepts.
pub const TEST_MAGIC: [u8; 4] = *b"RT01";

/// Build a precompiled entry: 16-byte header plus serialized body. Bodies
/// beginning with `CODE` unmarshal into code; anything else is "not code".
pub fn make_bytecode(magic: [u8; 4], flags: u32, timestamp: u32, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + body.len());
    out.extend_from_slice(&magic);
    out.write_u32::<LittleEndian>(flags).unwrap();
    out.write_u32::<LittleEndian>(timestamp).unwrap();
    out.write_u32::<LittleEndian>(body.len() as u32).unwrap();
    out.extend_from_slice(body);
    out
}

/// What the mock runtime produced for a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCode {
    /// Compiled from source: (normalized source text, display path).
    Compiled(String, String),
    /// Deserialized from a precompiled body (bytes after the `CODE` tag).
    Unmarshaled(Vec<u8>),
}

pub struct MockRuntime {
    pub magic: [u8; 4],
    pub hash_policy: HashPolicy,
    pub preference: SuffixPreference,
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self {
            magic: TEST_MAGIC,
            hash_policy: HashPolicy::Strict,
            preference: SuffixPreference::CompiledFirst,
        }
    }
}

impl HostRuntime for MockRuntime {
    type Code = MockCode;

    fn compile(&self, source: &[u8], display_path: &str) -> anyhow::Result<MockCode> {
        Ok(MockCode::Compiled(
            String::from_utf8_lossy(source).into_owned(),
            display_path.to_string(),
        ))
    }

    fn unmarshal(&self, data: &[u8]) -> anyhow::Result<UnmarshalOutcome<MockCode>> {
        if let Some(body) = data.strip_prefix(b"CODE") {
            Ok(UnmarshalOutcome::Code(MockCode::Unmarshaled(body.to_vec())))
        } else if data.starts_with(b"BOOM") {
            anyhow::bail!("corrupt serialized stream")
        } else {
            Ok(UnmarshalOutcome::NotCode)
        }
    }

    fn magic(&self) -> [u8; 4] {
        self.magic
    }

    fn hash_policy(&self) -> HashPolicy {
        self.hash_policy
    }

    fn suffix_preference(&self) -> SuffixPreference {
        self.preference
    }
}
