//! Entry data fetching.
//!
//! The directory records where each entry's local header sits; the data
//! itself starts after the header's variable-length name and extra field,
//! whose lengths may differ from the central directory's copy. Each fetch
//! opens the archive, validates the local header, reads exactly the
//! recorded compressed size and closes the file; no handle outlives the
//! call.

use flate2::read::DeflateDecoder;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use crate::error::{Result, ZipImportError};

use super::directory::ArchiveDirectory;
use super::structures::{CompressionMethod, LFH_SIGNATURE, LFH_SIZE};

/// Read and decompress the named entry's data.
pub fn get_entry_data(directory: &ArchiveDirectory, name: &str) -> Result<Vec<u8>> {
    let archive_path = directory.archive_path();
    let entry = directory
        .get(name)
        .ok_or_else(|| ZipImportError::EntryNotFound {
            path: archive_path.to_path_buf(),
            name: name.to_string(),
        })?;

    let mut file = File::open(archive_path).map_err(|source| ZipImportError::ArchiveOpen {
        path: archive_path.to_path_buf(),
        source,
    })?;

    // Reject sizes the file cannot possibly satisfy before reading.
    let file_size = file
        .metadata()
        .map_err(|source| ZipImportError::ArchiveRead {
            path: archive_path.to_path_buf(),
            source,
        })?
        .len();
    if entry.compressed_size as u64 > file_size {
        return Err(ZipImportError::InvalidEntrySize {
            path: archive_path.to_path_buf(),
            entry: name.to_string(),
            size: entry.compressed_size as u64,
        });
    }

    file.seek(SeekFrom::Start(entry.local_header_offset))
        .map_err(|source| ZipImportError::ArchiveRead {
            path: archive_path.to_path_buf(),
            source,
        })?;

    let mut header = [0u8; LFH_SIZE];
    file.read_exact(&mut header).map_err(|source| match source.kind() {
        std::io::ErrorKind::UnexpectedEof => ZipImportError::UnexpectedEof {
            path: archive_path.to_path_buf(),
        },
        _ => ZipImportError::ArchiveRead {
            path: archive_path.to_path_buf(),
            source,
        },
    })?;
    if &header[0..4] != LFH_SIGNATURE {
        return Err(ZipImportError::BadLocalFileHeader {
            path: archive_path.to_path_buf(),
            entry: name.to_string(),
        });
    }

    // The local header's own name/extra lengths decide where data starts.
    let name_length = u16::from_le_bytes([header[26], header[27]]) as u64;
    let extra_length = u16::from_le_bytes([header[28], header[29]]) as u64;

    let data_start = entry.local_header_offset + LFH_SIZE as u64 + name_length + extra_length;
    file.seek(SeekFrom::Start(data_start))
        .map_err(|source| ZipImportError::ArchiveRead {
            path: archive_path.to_path_buf(),
            source,
        })?;

    let mut raw = vec![0u8; entry.compressed_size as usize];
    file.read_exact(&mut raw)
        .map_err(|_| ZipImportError::TruncatedEntry {
            path: archive_path.to_path_buf(),
            entry: name.to_string(),
        })?;

    match entry.compression_method {
        CompressionMethod::Stored => Ok(raw),
        CompressionMethod::Deflate => {
            // Raw deflate stream: no zlib wrapper, no gzip header.
            let mut decoder = DeflateDecoder::new(raw.as_slice());
            let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
            decoder
                .read_to_end(&mut out)
                .map_err(|source| ZipImportError::Decompress {
                    path: archive_path.to_path_buf(),
                    entry: name.to_string(),
                    source,
                })?;
            Ok(out)
        }
        CompressionMethod::Unknown(method) => Err(ZipImportError::UnsupportedCompression {
            path: archive_path.to_path_buf(),
            entry: name.to_string(),
            method,
        }),
    }
}
