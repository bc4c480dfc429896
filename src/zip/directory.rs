//! Central-directory parsing.
//!
//! ZIP files are read from the back: the End of Central Directory record
//! sits in the last 22 bytes (this loader does not accept trailing archive
//! comments), and locates the Central Directory, which in turn locates
//! every entry's local header.
//!
//! Archives may carry arbitrary leading bytes (a self-extractor stub, a
//! launcher script). Every offset recorded inside the ZIP is relative to
//! the true body start, so the parser derives the prefix length from where
//! the central directory actually sits versus where the EOCD claims it
//! sits, and corrects every local-header offset while parsing. The whole
//! directory is parsed eagerly in one pass; lookups afterwards are plain
//! map accesses and the result is never mutated.

use byteorder::{LittleEndian, ReadBytesExt};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use crate::error::{Result, ZipImportError};

use super::structures::{
    CDFH_SIGNATURE, CDFH_SIZE, CompressionMethod, EOCD_SIZE, EndOfCentralDirectory, ZipEntry,
    decode_entry_name,
};

/// Immutable snapshot of one archive's central directory.
///
/// Keys are entry names with `/` replaced by the host path separator.
/// Directory entries keep their trailing separator. If the archive changes
/// on disk after parsing, behavior is undefined (import-time assumption).
#[derive(Debug)]
pub struct ArchiveDirectory {
    archive_path: PathBuf,
    entries: HashMap<String, ZipEntry>,
    /// Byte length of any data prepended to the ZIP body.
    arc_offset: u64,
}

impl ArchiveDirectory {
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Prefix length correction applied to every stored local-header
    /// offset.
    pub fn arc_offset(&self) -> u64 {
        self.arc_offset
    }

    pub fn get(&self, name: &str) -> Option<&ZipEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &ZipEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse the central directory of the archive at `archive_path`.
///
/// Every structural violation is a permanent typed error; nothing here is
/// retried.
pub fn read_directory(archive_path: &Path) -> Result<ArchiveDirectory> {
    let mut file = File::open(archive_path).map_err(|source| ZipImportError::ArchiveOpen {
        path: archive_path.to_path_buf(),
        source,
    })?;

    let file_size = file
        .seek(SeekFrom::End(0))
        .map_err(|source| ZipImportError::ArchiveRead {
            path: archive_path.to_path_buf(),
            source,
        })?;
    if file_size < EOCD_SIZE as u64 {
        return Err(ZipImportError::NotAZipFile {
            path: archive_path.to_path_buf(),
        });
    }

    // EOCD is the fixed-size trailer.
    let eocd_position = file_size - EOCD_SIZE as u64;
    let mut eocd_buf = [0u8; EOCD_SIZE];
    read_exact_at(&mut file, archive_path, eocd_position, &mut eocd_buf)?;
    let eocd =
        EndOfCentralDirectory::from_bytes(&eocd_buf).ok_or_else(|| ZipImportError::NotAZipFile {
            path: archive_path.to_path_buf(),
        })?;

    let cd_size = eocd.cd_size as u64;
    let cd_offset = eocd.cd_offset as u64;

    // The directory's true position is derived from the file end, not from
    // the EOCD's offset field: prepended bytes shift recorded offsets by a
    // constant the EOCD knows nothing about.
    if eocd_position < cd_size || eocd_position < cd_offset {
        return Err(ZipImportError::BadCentralDirectory {
            path: archive_path.to_path_buf(),
        });
    }
    let header_position = eocd_position - cd_size;
    if header_position < cd_offset {
        return Err(ZipImportError::BadCentralDirectory {
            path: archive_path.to_path_buf(),
        });
    }
    let arc_offset = header_position - cd_offset;

    // Read from the directory start through the EOCD in one shot, then
    // parse records out of memory. The trailing EOCD signature is what
    // terminates the record loop.
    let mut cd_buf = vec![0u8; (file_size - header_position) as usize];
    read_exact_at(&mut file, archive_path, header_position, &mut cd_buf)?;

    let mut entries = HashMap::new();
    let mut cursor = Cursor::new(cd_buf.as_slice());

    loop {
        let remaining = cd_buf.len() as u64 - cursor.position();
        if remaining < 4 {
            return Err(ZipImportError::UnexpectedEof {
                path: archive_path.to_path_buf(),
            });
        }

        let mut signature = [0u8; 4];
        cursor.read_exact(&mut signature).map_err(|source| {
            ZipImportError::ArchiveRead {
                path: archive_path.to_path_buf(),
                source,
            }
        })?;
        if signature != CDFH_SIGNATURE {
            // End of the central directory (normally the EOCD signature).
            break;
        }
        if remaining < CDFH_SIZE as u64 {
            return Err(ZipImportError::UnexpectedEof {
                path: archive_path.to_path_buf(),
            });
        }

        let (name, entry) = parse_record(&mut cursor, archive_path, cd_offset, arc_offset)?;
        entries.insert(name, entry);
    }

    Ok(ArchiveDirectory {
        archive_path: archive_path.to_path_buf(),
        entries,
        arc_offset,
    })
}

/// Parse one 46-byte central-directory file header (signature already
/// consumed) plus its variable-length tail.
fn parse_record(
    cursor: &mut Cursor<&[u8]>,
    archive_path: &Path,
    cd_offset: u64,
    arc_offset: u64,
) -> Result<(String, ZipEntry)> {
    let eof = |source| ZipImportError::ArchiveRead {
        path: archive_path.to_path_buf(),
        source,
    };

    let _version_made_by = cursor.read_u16::<LittleEndian>().map_err(eof)?;
    let _version_needed = cursor.read_u16::<LittleEndian>().map_err(eof)?;
    let flags = cursor.read_u16::<LittleEndian>().map_err(eof)?;
    let compression_method = cursor.read_u16::<LittleEndian>().map_err(eof)?;
    let mod_time = cursor.read_u16::<LittleEndian>().map_err(eof)?;
    let mod_date = cursor.read_u16::<LittleEndian>().map_err(eof)?;
    let crc32 = cursor.read_u32::<LittleEndian>().map_err(eof)?;
    let compressed_size = cursor.read_u32::<LittleEndian>().map_err(eof)?;
    let uncompressed_size = cursor.read_u32::<LittleEndian>().map_err(eof)?;
    let name_length = cursor.read_u16::<LittleEndian>().map_err(eof)?;
    let extra_length = cursor.read_u16::<LittleEndian>().map_err(eof)?;
    let comment_length = cursor.read_u16::<LittleEndian>().map_err(eof)?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>().map_err(eof)?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>().map_err(eof)?;
    let _external_attrs = cursor.read_u32::<LittleEndian>().map_err(eof)?;
    let local_header_offset = cursor.read_u32::<LittleEndian>().map_err(eof)? as u64;

    let mut name_bytes = vec![0u8; name_length as usize];
    cursor.read_exact(&mut name_bytes).map_err(|_| {
        ZipImportError::UnexpectedEof {
            path: archive_path.to_path_buf(),
        }
    })?;

    // An entry cannot claim to start inside or after the central directory.
    if local_header_offset > cd_offset {
        return Err(ZipImportError::BadLocalHeaderOffset {
            path: archive_path.to_path_buf(),
            entry: String::from_utf8_lossy(&name_bytes).into_owned(),
        });
    }

    // Skip the extra field and comment (read-and-discard keeps the stream
    // position honest).
    let skip = extra_length as usize + comment_length as usize;
    let mut discard = vec![0u8; skip];
    cursor.read_exact(&mut discard).map_err(|_| {
        ZipImportError::UnexpectedEof {
            path: archive_path.to_path_buf(),
        }
    })?;

    let name = decode_entry_name(&name_bytes, flags);
    let display_path = format!("{}{}{}", archive_path.display(), MAIN_SEPARATOR, name);

    let entry = ZipEntry {
        display_path,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        local_header_offset: local_header_offset + arc_offset,
        mod_time,
        mod_date,
        crc32,
    };
    Ok((name, entry))
}

fn read_exact_at(
    file: &mut File,
    archive_path: &Path,
    offset: u64,
    buf: &mut [u8],
) -> Result<()> {
    file.seek(SeekFrom::Start(offset))
        .map_err(|source| ZipImportError::ArchiveRead {
            path: archive_path.to_path_buf(),
            source,
        })?;
    file.read_exact(buf)
        .map_err(|source| match source.kind() {
            std::io::ErrorKind::UnexpectedEof => ZipImportError::UnexpectedEof {
                path: archive_path.to_path_buf(),
            },
            _ => ZipImportError::ArchiveRead {
                path: archive_path.to_path_buf(),
                source,
            },
        })
}
