use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;
use std::path::MAIN_SEPARATOR;

/// End of Central Directory (EOCD) signature - PK\x05\x06
pub const EOCD_SIGNATURE: &[u8] = b"PK\x05\x06";
/// EOCD record size (no comment)
pub const EOCD_SIZE: usize = 22;

/// Central Directory File Header (CDFH) signature - PK\x01\x02
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
/// CDFH fixed-size portion
pub const CDFH_SIZE: usize = 46;

/// Local File Header (LFH) signature - PK\x03\x04
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
/// LFH fixed-size portion
pub const LFH_SIZE: usize = 30;

/// General-purpose flag bit marking a UTF-8 encoded entry name.
pub const FLAG_UTF8_NAME: u16 = 0x800;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// One parsed central-directory entry, reduced to what load time needs.
///
/// `local_header_offset` is already corrected for any bytes prepended to
/// the archive (self-extractor stubs): it is a true on-disk offset, not the
/// raw value recorded in the central directory.
#[derive(Debug, Clone)]
pub struct ZipEntry {
    /// `archive + separator + entry_name`, for diagnostics and `__file__`.
    pub display_path: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub local_header_offset: u64,
    /// MS-DOS packed modification time (bits: hhhhhmmmmmmsssss, 2s units).
    pub mod_time: u16,
    /// MS-DOS packed modification date (bits: yyyyyyymmmmddddd, 1980-based).
    pub mod_date: u16,
    /// Parsed but never verified against the data.
    pub crc32: u32,
}

impl ZipEntry {
    /// Entry mtime as Unix seconds (UTC interpretation of the DOS fields).
    pub fn mtime(&self) -> i64 {
        dos_datetime_to_unix(self.mod_date, self.mod_time)
    }
}

/// End of Central Directory record - 22 bytes minimum
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    /// Parse the fixed 22-byte EOCD record. Returns `None` when the buffer
    /// is short or the signature does not match; the caller owns error
    /// shaping (it knows the archive path).
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < EOCD_SIZE || &data[0..4] != EOCD_SIGNATURE {
            return None;
        }

        let mut cursor = Cursor::new(&data[4..]);

        // Reads from a 22-byte slice cannot fail.
        Some(Self {
            disk_number: cursor.read_u16::<LittleEndian>().ok()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>().ok()?,
            disk_entries: cursor.read_u16::<LittleEndian>().ok()?,
            total_entries: cursor.read_u16::<LittleEndian>().ok()?,
            cd_size: cursor.read_u32::<LittleEndian>().ok()?,
            cd_offset: cursor.read_u32::<LittleEndian>().ok()?,
            comment_len: cursor.read_u16::<LittleEndian>().ok()?,
        })
    }
}

/// Convert MS-DOS packed date/time fields to Unix seconds.
///
/// DOS dates start at 1980 and have 2-second time resolution. Out-of-range
/// month/day values (some tools write zeroes) are clamped rather than
/// rejected; the result only feeds a staleness comparison.
pub fn dos_datetime_to_unix(date: u16, time: u16) -> i64 {
    let year = ((date >> 9) & 0x7f) as i64 + 1980;
    let month = (((date >> 5) & 0x0f) as i64).clamp(1, 12);
    let day = ((date & 0x1f) as i64).max(1);

    let hour = ((time >> 11) & 0x1f) as i64;
    let minute = ((time >> 5) & 0x3f) as i64;
    let second = ((time & 0x1f) * 2) as i64;

    days_from_civil(year, month, day) * 86400 + hour * 3600 + minute * 60 + second
}

/// Days from 1970-01-01 for a proleptic Gregorian civil date.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let doy = (153 * (if month > 2 { month - 3 } else { month + 9 }) + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146097 + doe - 719468
}

/// Decode a raw entry name from the central directory.
///
/// UTF-8-flagged names decode as UTF-8 (invalid sequences replaced); other
/// names are ASCII when they can be, with a code-page-437 fallback for
/// legacy archives. `/` becomes the host path separator either way.
pub fn decode_entry_name(raw: &[u8], flags: u16) -> String {
    let name = if flags & FLAG_UTF8_NAME != 0 || raw.is_ascii() {
        String::from_utf8_lossy(raw).into_owned()
    } else {
        raw.iter().map(|&b| cp437_to_char(b)).collect()
    };

    if MAIN_SEPARATOR == '/' {
        name
    } else {
        name.replace('/', &MAIN_SEPARATOR.to_string())
    }
}

/// Map one CP437 byte to its Unicode character.
fn cp437_to_char(b: u8) -> char {
    if b < 0x80 {
        b as char
    } else {
        CP437_HIGH[(b - 0x80) as usize]
    }
}

/// Code page 437, upper half (0x80..=0xFF). The lower half is ASCII
/// identity. This table is a fixed compatibility contract for archives
/// written by legacy tools without the UTF-8 name flag.
#[rustfmt::skip]
const CP437_HIGH: [char; 128] = [
    '\u{00c7}', '\u{00fc}', '\u{00e9}', '\u{00e2}', '\u{00e4}', '\u{00e0}', '\u{00e5}', '\u{00e7}',
    '\u{00ea}', '\u{00eb}', '\u{00e8}', '\u{00ef}', '\u{00ee}', '\u{00ec}', '\u{00c4}', '\u{00c5}',
    '\u{00c9}', '\u{00e6}', '\u{00c6}', '\u{00f4}', '\u{00f6}', '\u{00f2}', '\u{00fb}', '\u{00f9}',
    '\u{00ff}', '\u{00d6}', '\u{00dc}', '\u{00a2}', '\u{00a3}', '\u{00a5}', '\u{20a7}', '\u{0192}',
    '\u{00e1}', '\u{00ed}', '\u{00f3}', '\u{00fa}', '\u{00f1}', '\u{00d1}', '\u{00aa}', '\u{00ba}',
    '\u{00bf}', '\u{2310}', '\u{00ac}', '\u{00bd}', '\u{00bc}', '\u{00a1}', '\u{00ab}', '\u{00bb}',
    '\u{2591}', '\u{2592}', '\u{2593}', '\u{2502}', '\u{2524}', '\u{2561}', '\u{2562}', '\u{2556}',
    '\u{2555}', '\u{2563}', '\u{2551}', '\u{2557}', '\u{255d}', '\u{255c}', '\u{255b}', '\u{2510}',
    '\u{2514}', '\u{2534}', '\u{252c}', '\u{251c}', '\u{2500}', '\u{253c}', '\u{255e}', '\u{255f}',
    '\u{255a}', '\u{2554}', '\u{2569}', '\u{2566}', '\u{2560}', '\u{2550}', '\u{256c}', '\u{2567}',
    '\u{2568}', '\u{2564}', '\u{2565}', '\u{2559}', '\u{2558}', '\u{2552}', '\u{2553}', '\u{256b}',
    '\u{256a}', '\u{2518}', '\u{250c}', '\u{2588}', '\u{2584}', '\u{258c}', '\u{2590}', '\u{2580}',
    '\u{03b1}', '\u{00df}', '\u{0393}', '\u{03c0}', '\u{03a3}', '\u{03c3}', '\u{00b5}', '\u{03c4}',
    '\u{03a6}', '\u{0398}', '\u{03a9}', '\u{03b4}', '\u{221e}', '\u{03c6}', '\u{03b5}', '\u{2229}',
    '\u{2261}', '\u{00b1}', '\u{2265}', '\u{2264}', '\u{2320}', '\u{2321}', '\u{00f7}', '\u{2248}',
    '\u{00b0}', '\u{2219}', '\u{00b7}', '\u{221a}', '\u{207f}', '\u{00b2}', '\u{25a0}', '\u{00a0}',
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dos_epoch_start() {
        // 1980-01-01 00:00:00, the DOS epoch, is 315532800 Unix seconds.
        assert_eq!(dos_datetime_to_unix(0x0021, 0x0000), 315532800);
    }

    #[test]
    fn dos_known_datetime() {
        // 2024-06-15 12:30:40 UTC
        let date = (44 << 9) | (6 << 5) | 15;
        let time = (12 << 11) | (30 << 5) | 20;
        assert_eq!(dos_datetime_to_unix(date, time), 1718454640);
    }

    #[test]
    fn dos_two_second_resolution() {
        let date = (44 << 9) | (1 << 5) | 1;
        let t = dos_datetime_to_unix(date, 1); // seconds field 1 => 2s
        assert_eq!(t % 60, 2);
    }

    #[test]
    fn dos_zero_month_day_clamped() {
        // Should not panic or produce a pre-DOS-epoch value.
        assert!(dos_datetime_to_unix(0, 0) >= 315532800);
    }

    #[test]
    fn ascii_name_passthrough() {
        assert_eq!(decode_entry_name(b"pkg/mod.py", 0), "pkg/mod.py");
    }

    #[test]
    fn utf8_flagged_name() {
        assert_eq!(
            decode_entry_name("caf\u{e9}.py".as_bytes(), FLAG_UTF8_NAME),
            "caf\u{e9}.py"
        );
    }

    #[test]
    fn cp437_fallback() {
        // 0x82 is é in CP437.
        assert_eq!(decode_entry_name(b"caf\x82.py", 0), "caf\u{e9}.py");
        // 0xE1 is ß, not a Greek letter.
        assert_eq!(cp437_to_char(0xe1), '\u{df}');
    }

    #[test]
    fn eocd_rejects_bad_signature() {
        let mut buf = [0u8; EOCD_SIZE];
        buf[..4].copy_from_slice(b"PK\x06\x06");
        assert!(EndOfCentralDirectory::from_bytes(&buf).is_none());
    }

    #[test]
    fn eocd_parses_fields() {
        let mut buf = [0u8; EOCD_SIZE];
        buf[..4].copy_from_slice(EOCD_SIGNATURE);
        buf[12..16].copy_from_slice(&100u32.to_le_bytes());
        buf[16..20].copy_from_slice(&4096u32.to_le_bytes());
        let eocd = EndOfCentralDirectory::from_bytes(&buf).unwrap();
        assert_eq!(eocd.cd_size, 100);
        assert_eq!(eocd.cd_offset, 4096);
    }
}
