//! lzop archive header.
//!
//! Layout (all integers big-endian):
//!
//! ```text
//! magic[9] version u16 lib_version u16 [version_needed u16]
//! method u8 [level u8] flags u32 [filter u32] mode u32
//! mtime_low u32 [mtime_high u32] name_len u8 name[name_len] checksum u32
//! [extra_len u32 extra[extra_len] extra_checksum u32]
//! ```
//!
//! Bracketed fields depend on the version or the flags. The header checksum
//! covers every byte after the magic and is Adler-32 unless `H_CRC32` is
//! set.

use bitflags::bitflags;
use log::{debug, warn};
use oxilzo_core::checksum::Checksum;
use oxilzo_core::error::{LzoError, Result};
use oxilzo_lzo1x::Variant;
use std::fmt;
use std::io::{Read, Write};

/// lzop magic cookie.
pub const MAGIC: [u8; 9] = [0x89, 0x4C, 0x5A, 0x4F, 0x00, 0x0D, 0x0A, 0x1A, 0x0A];

/// Archive version written by this library.
pub const VERSION: u16 = 0x1030;

/// LZO library version recorded in written headers.
pub const LIB_VERSION: u16 = 0x2060;

/// Minimum version needed to extract archives written by this library.
pub const VERSION_NEEDED: u16 = 0x0940;

/// Oldest archive version that can be read.
const MIN_VERSION: u16 = 0x0900;

/// Largest extra field accepted on read.
const MAX_EXTRA_FIELD: usize = 64 * 1024;

/// Flag bits that must be zero.
const RESERVED_FLAGS: u32 = 0x000F_C000;

/// Operating system code for Unix, stored in the top byte of the flags.
pub const OS_UNIX: u8 = 3;

bitflags! {
    /// Header flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        /// Blocks carry an Adler-32 of the uncompressed data.
        const ADLER32_D = 0x0000_0001;
        /// Compressed blocks carry an Adler-32 of the compressed data.
        const ADLER32_C = 0x0000_0002;
        /// Input was read from stdin.
        const STDIN = 0x0000_0004;
        /// Output was written to stdout.
        const STDOUT = 0x0000_0008;
        /// Name was derived from the archive name.
        const NAME_DEFAULT = 0x0000_0010;
        /// Written on a DOS-like system.
        const DOSISH = 0x0000_0020;
        /// An extra field follows the header.
        const H_EXTRA_FIELD = 0x0000_0040;
        /// Header carries a GMT offset.
        const H_GMTDIFF = 0x0000_0080;
        /// Blocks carry a CRC-32 of the uncompressed data.
        const CRC32_D = 0x0000_0100;
        /// Compressed blocks carry a CRC-32 of the compressed data.
        const CRC32_C = 0x0000_0200;
        /// Part of a multi-part archive.
        const MULTIPART = 0x0000_0400;
        /// A filter was applied before compression.
        const H_FILTER = 0x0000_0800;
        /// Header checksum is CRC-32 instead of Adler-32.
        const H_CRC32 = 0x0000_1000;
        /// Name includes a path.
        const H_PATH = 0x0000_2000;
        /// Operating system code.
        const OS_MASK = 0xFF00_0000;
        /// Character set of the name.
        const CHARSET_MASK = 0x00F0_0000;
    }
}

impl Flags {
    /// Operating system code from the top byte.
    pub fn os(self) -> u8 {
        (self.bits() >> 24) as u8
    }

    /// Replace the operating system code.
    pub fn with_os(self, os: u8) -> Self {
        (self - Self::OS_MASK) | Self::from_bits_retain(u32::from(os) << 24)
    }

    /// Checksum algorithm protecting the header.
    pub fn header_checksum(self) -> Checksum {
        if self.contains(Self::H_CRC32) {
            Checksum::Crc32
        } else {
            Checksum::Adler32
        }
    }
}

/// Compression method recorded in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Method {
    /// LZO1X-1.
    #[default]
    Lzo1x1 = 1,
    /// LZO1X-1(15).
    Lzo1x1_15 = 2,
    /// LZO1X-999. Decoded but never produced.
    Lzo1x999 = 3,
}

impl Method {
    /// Method from its header byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Lzo1x1),
            2 => Some(Self::Lzo1x1_15),
            3 => Some(Self::Lzo1x999),
            _ => None,
        }
    }

    /// Compressor variant producing this method, if supported.
    pub fn variant(self) -> Option<Variant> {
        match self {
            Self::Lzo1x1 => Some(Variant::Lzo1x1),
            Self::Lzo1x1_15 => Some(Variant::Lzo1x1_15),
            Self::Lzo1x999 => None,
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Lzo1x1 => "LZO1X-1",
            Self::Lzo1x1_15 => "LZO1X-1(15)",
            Self::Lzo1x999 => "LZO1X-999",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parsed or to-be-written archive header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LzopHeader {
    /// Archive format version.
    pub version: u16,
    /// LZO library version of the writer.
    pub lib_version: u16,
    /// Minimum version needed to extract.
    pub version_needed: u16,
    /// Compression method.
    pub method: Method,
    /// Compression level (0 for legacy archives).
    pub level: u8,
    /// Header flags, including OS and charset.
    pub flags: Flags,
    /// Unix mode of the original file.
    pub mode: u32,
    /// Modification time in seconds since the epoch.
    pub mtime: u64,
    /// Original file name, possibly empty.
    pub name: String,
    /// Contents of the optional extra field. Read only.
    pub extra_field: Option<Vec<u8>>,
}

impl Default for LzopHeader {
    fn default() -> Self {
        Self {
            version: VERSION,
            lib_version: LIB_VERSION,
            version_needed: VERSION_NEEDED,
            method: Method::Lzo1x1,
            level: 5,
            flags: Flags::ADLER32_D.with_os(OS_UNIX),
            mode: 0o100644,
            mtime: 0,
            name: String::new(),
            extra_field: None,
        }
    }
}

/// Outcome of parsing a possibly incomplete header buffer.
#[derive(Debug)]
pub(crate) enum Parsed {
    /// The header and the number of bytes it occupies.
    Complete(LzopHeader, usize),
    /// At least `needed` bytes are required to make progress.
    Incomplete(usize),
}

enum Short {
    Need(usize),
    Fail(LzoError),
}

impl From<LzoError> for Short {
    fn from(err: LzoError) -> Self {
        Self::Fail(err)
    }
}

struct FieldCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldCursor<'a> {
    fn take(&mut self, n: usize) -> std::result::Result<&'a [u8], Short> {
        let end = self.pos + n;
        let bytes = self.buf.get(self.pos..end).ok_or(Short::Need(end))?;
        self.pos = end;
        Ok(bytes)
    }

    fn u8(&mut self) -> std::result::Result<u8, Short> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> std::result::Result<u16, Short> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> std::result::Result<u32, Short> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

impl LzopHeader {
    /// Header with default fields and the given name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Checksum algorithm protecting this header.
    pub fn header_checksum(&self) -> Checksum {
        self.flags.header_checksum()
    }

    /// Serialize the header.
    ///
    /// Fails if the name exceeds 255 bytes or the flags request fields this
    /// library does not write (filter, extra field, multi-part).
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.version < VERSION_NEEDED {
            return Err(LzoError::invalid_header(format!(
                "cannot write legacy header version {:#06x}",
                self.version
            )));
        }
        let name = self.name.as_bytes();
        let name_len = u8::try_from(name.len()).map_err(|_| {
            LzoError::invalid_header(format!("name is {} bytes, limit is 255", name.len()))
        })?;
        let unwritable = Flags::H_FILTER | Flags::H_EXTRA_FIELD | Flags::MULTIPART;
        if self.flags.intersects(unwritable) {
            return Err(LzoError::invalid_header(format!(
                "flags {:#010x} request fields that are not written",
                self.flags.bits()
            )));
        }

        let mut buf = Vec::with_capacity(MAGIC.len() + 34 + name.len());
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&self.version.to_be_bytes());
        buf.extend_from_slice(&self.lib_version.to_be_bytes());
        buf.extend_from_slice(&self.version_needed.to_be_bytes());
        buf.push(self.method as u8);
        buf.push(self.level);
        buf.extend_from_slice(&self.flags.bits().to_be_bytes());
        buf.extend_from_slice(&self.mode.to_be_bytes());
        buf.extend_from_slice(&(self.mtime as u32).to_be_bytes());
        buf.extend_from_slice(&((self.mtime >> 32) as u32).to_be_bytes());
        buf.push(name_len);
        buf.extend_from_slice(name);

        let checksum = self.header_checksum().compute(&buf[MAGIC.len()..]);
        buf.extend_from_slice(&checksum.to_be_bytes());
        Ok(buf)
    }

    /// Write the header to `writer` with a single `write_all`.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let bytes = self.to_bytes()?;
        writer.write_all(&bytes)?;
        debug!(
            "wrote lzop header: {} bytes, method {}, level {}, flags {:#010x}, name {:?}",
            bytes.len(),
            self.method,
            self.level,
            self.flags.bits(),
            self.name
        );
        Ok(bytes.len())
    }

    /// Read and validate a header, consuming exactly its bytes.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = Vec::with_capacity(64);
        loop {
            match Self::parse(&buf)? {
                Parsed::Complete(header, _) => return Ok(header),
                Parsed::Incomplete(needed) => {
                    let missing = (needed - buf.len()) as u64;
                    reader.by_ref().take(missing).read_to_end(&mut buf)?;
                    if buf.len() < needed {
                        // A short source can still show a wrong magic prefix.
                        Self::parse(&buf)?;
                        return Err(LzoError::truncated("archive header"));
                    }
                }
            }
        }
    }

    /// Parse a header from the front of `buf`.
    pub(crate) fn parse(buf: &[u8]) -> Result<Parsed> {
        let prefix = buf.len().min(MAGIC.len());
        if buf[..prefix] != MAGIC[..prefix] {
            return Err(LzoError::invalid_magic(MAGIC.to_vec(), buf[..prefix].to_vec()));
        }

        let mut cursor = FieldCursor {
            buf,
            pos: MAGIC.len(),
        };
        if buf.len() < MAGIC.len() {
            return Ok(Parsed::Incomplete(MAGIC.len()));
        }

        match Self::parse_fields(&mut cursor) {
            Ok(header) => {
                debug!(
                    "read lzop header: version {:#06x}, method {}, level {}, flags {:#010x}, name {:?}",
                    header.version,
                    header.method,
                    header.level,
                    header.flags.bits(),
                    header.name
                );
                Ok(Parsed::Complete(header, cursor.pos))
            }
            Err(Short::Need(needed)) => Ok(Parsed::Incomplete(needed)),
            Err(Short::Fail(err)) => Err(err),
        }
    }

    fn parse_fields(c: &mut FieldCursor<'_>) -> std::result::Result<Self, Short> {
        let version = c.u16()?;
        if version < MIN_VERSION {
            return Err(LzoError::UnsupportedVersion { version }.into());
        }
        let modern = version >= VERSION_NEEDED;

        let lib_version = c.u16()?;
        let version_needed = if modern {
            let needed = c.u16()?;
            if !(MIN_VERSION..=VERSION).contains(&needed) {
                return Err(LzoError::UnsupportedVersion { version: needed }.into());
            }
            needed
        } else {
            version
        };

        let method_byte = c.u8()?;
        let level = if modern { c.u8()? } else { 0 };
        let raw_flags = c.u32()?;
        let flags = Flags::from_bits_retain(raw_flags);
        if flags.contains(Flags::H_FILTER) {
            c.u32()?;
        }
        let mode = c.u32()?;
        let mtime_low = c.u32()?;
        let mtime_high = if modern { c.u32()? } else { 0 };
        let name_len = usize::from(c.u8()?);
        let name = c.take(name_len)?;

        let covered_end = c.pos;
        let stored = c.u32()?;
        let kind = flags.header_checksum();
        let computed = kind.compute(&c.buf[MAGIC.len()..covered_end]);
        if stored != computed {
            warn!(
                "lzop header {} mismatch: stored {:#010x}, computed {:#010x}",
                kind, stored, computed
            );
            return Err(LzoError::header_checksum(stored, computed).into());
        }

        let extra_field = if flags.contains(Flags::H_EXTRA_FIELD) {
            let start = c.pos;
            let len = c.u32()? as usize;
            if len > MAX_EXTRA_FIELD {
                return Err(LzoError::invalid_header(format!(
                    "extra field of {} bytes exceeds the {} byte limit",
                    len, MAX_EXTRA_FIELD
                ))
                .into());
            }
            let data = c.take(len)?;
            let covered_end = c.pos;
            let stored = c.u32()?;
            let computed = kind.compute(&c.buf[start..covered_end]);
            if stored != computed {
                warn!(
                    "lzop extra field {} mismatch: stored {:#010x}, computed {:#010x}",
                    kind, stored, computed
                );
                return Err(LzoError::header_checksum(stored, computed).into());
            }
            Some(data.to_vec())
        } else {
            None
        };

        if raw_flags & RESERVED_FLAGS != 0 {
            return Err(LzoError::invalid_header(format!(
                "reserved flag bits set: {:#010x}",
                raw_flags & RESERVED_FLAGS
            ))
            .into());
        }
        if flags.contains(Flags::H_FILTER) {
            return Err(LzoError::invalid_header("filtered archives are not supported").into());
        }
        if flags.contains(Flags::MULTIPART) {
            return Err(LzoError::invalid_header("multi-part archives are not supported").into());
        }
        let method = Method::from_u8(method_byte).ok_or(LzoError::UnsupportedMethod {
            method: method_byte,
        })?;

        Ok(Self {
            version,
            lib_version,
            version_needed,
            method,
            level,
            flags,
            mode: if flags.contains(Flags::STDIN) { 0 } else { mode },
            mtime: u64::from(mtime_low) | (u64::from(mtime_high) << 32),
            name: String::from_utf8_lossy(name).into_owned(),
            extra_field,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Header of an lzop archive of an empty file named `empty.txt`.
    const EMPTY_TXT: [u8; 47] = [
        0x89, 0x4c, 0x5a, 0x4f, 0x00, 0x0d, 0x0a, 0x1a, 0x0a, 0x10, 0x30, 0x20, 0x60, 0x09, 0x40,
        0x01, 0x05, 0x03, 0x00, 0x00, 0x01, 0x00, 0x00, 0x81, 0xb4, 0x51, 0xcf, 0x50, 0x65, 0x00,
        0x00, 0x00, 0x00, 0x09, 0x65, 0x6d, 0x70, 0x74, 0x79, 0x2e, 0x74, 0x78, 0x74, 0x6a, 0x20,
        0x07, 0xe4,
    ];

    fn empty_txt_header() -> LzopHeader {
        LzopHeader {
            mode: 0o100664,
            mtime: 0x51cf_5065,
            ..LzopHeader::with_name("empty.txt")
        }
    }

    #[test]
    fn test_encode_known_header() {
        assert_eq!(empty_txt_header().to_bytes().unwrap(), EMPTY_TXT);
    }

    #[test]
    fn test_decode_known_header() {
        let mut cursor = Cursor::new(&EMPTY_TXT[..]);
        let header = LzopHeader::read(&mut cursor).unwrap();
        assert_eq!(header, empty_txt_header());
        assert_eq!(header.flags.os(), OS_UNIX);
        assert_eq!(cursor.position() as usize, EMPTY_TXT.len());
    }

    #[test]
    fn test_header_roundtrip_crc32_and_high_mtime() {
        let header = LzopHeader {
            flags: Flags::CRC32_D | Flags::H_CRC32 | Flags::empty().with_os(OS_UNIX),
            mtime: 0x0000_0001_2345_6789,
            name: "dir/файл.bin".to_string(),
            ..LzopHeader::default()
        };
        let bytes = header.to_bytes().unwrap();
        let parsed = LzopHeader::read(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.header_checksum(), Checksum::Crc32);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = EMPTY_TXT;
        bytes[1] = b'X';
        let err = LzopHeader::read(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, LzoError::InvalidMagic { .. }));

        let err = LzopHeader::read(&mut Cursor::new(b"PK")).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_header_checksum_mismatch() {
        for i in MAGIC.len()..EMPTY_TXT.len() {
            let mut bytes = EMPTY_TXT;
            bytes[i] ^= 0x01;
            let err = LzopHeader::read(&mut Cursor::new(bytes)).unwrap_err();
            assert!(
                err.is_checksum_error() || err.is_format_error() || matches!(err, LzoError::Truncated { .. }),
                "byte {i}: {err}"
            );
        }
    }

    #[test]
    fn test_truncated_header() {
        for len in 0..EMPTY_TXT.len() {
            let err = LzopHeader::read(&mut Cursor::new(&EMPTY_TXT[..len])).unwrap_err();
            assert!(matches!(err, LzoError::Truncated { .. }), "length {len}");
        }
    }

    #[test]
    fn test_unsupported_version_needed() {
        let mut header = empty_txt_header();
        header.version_needed = 0x2000;
        let bytes = header.to_bytes().unwrap();
        let err = LzopHeader::read(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, LzoError::UnsupportedVersion { version: 0x2000 }));
    }

    #[test]
    fn test_unknown_method() {
        let mut bytes = empty_txt_header().to_bytes().unwrap();
        bytes[15] = 0x07;
        let end = bytes.len() - 4;
        let checksum = Checksum::Adler32.compute(&bytes[MAGIC.len()..end]);
        bytes[end..].copy_from_slice(&checksum.to_be_bytes());
        let err = LzopHeader::read(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, LzoError::UnsupportedMethod { method: 7 }));
    }

    #[test]
    fn test_legacy_header() {
        // version 0x0940 minus one: no version_needed, level or mtime_high
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&0x0930u16.to_be_bytes());
        bytes.extend_from_slice(&0x0930u16.to_be_bytes());
        bytes.push(1);
        bytes.extend_from_slice(&(Flags::ADLER32_D.bits()).to_be_bytes());
        bytes.extend_from_slice(&0o100600u32.to_be_bytes());
        bytes.extend_from_slice(&1234u32.to_be_bytes());
        bytes.push(1);
        bytes.push(b'x');
        let checksum = Checksum::Adler32.compute(&bytes[MAGIC.len()..]);
        bytes.extend_from_slice(&checksum.to_be_bytes());

        let header = LzopHeader::read(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(header.version, 0x0930);
        assert_eq!(header.level, 0);
        assert_eq!(header.mtime, 1234);
        assert_eq!(header.name, "x");
    }

    #[test]
    fn test_extra_field_is_read() {
        let header = empty_txt_header();
        let mut bytes = header.to_bytes().unwrap();

        // Patch the flag in and recompute the header checksum.
        let flags = (header.flags | Flags::H_EXTRA_FIELD).bits();
        bytes[17..21].copy_from_slice(&flags.to_be_bytes());
        let end = bytes.len() - 4;
        let checksum = Checksum::Adler32.compute(&bytes[MAGIC.len()..end]);
        bytes[end..].copy_from_slice(&checksum.to_be_bytes());

        let extra_start = bytes.len();
        bytes.extend_from_slice(&3u32.to_be_bytes());
        bytes.extend_from_slice(b"abc");
        let checksum = Checksum::Adler32.compute(&bytes[extra_start..]);
        bytes.extend_from_slice(&checksum.to_be_bytes());

        let parsed = LzopHeader::read(&mut Cursor::new(bytes.clone())).unwrap();
        assert_eq!(parsed.extra_field.as_deref(), Some(&b"abc"[..]));

        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let err = LzopHeader::read(&mut Cursor::new(bytes)).unwrap_err();
        assert!(err.is_checksum_error());
    }

    /// Known header with `extra` flags added and its checksum redone.
    fn with_flags(extra: Flags) -> Vec<u8> {
        let mut bytes = empty_txt_header().to_bytes().unwrap();
        let flags = u32::from_be_bytes([bytes[17], bytes[18], bytes[19], bytes[20]]) | extra.bits();
        bytes[17..21].copy_from_slice(&flags.to_be_bytes());
        reseal(&mut bytes);
        bytes
    }

    fn reseal(bytes: &mut [u8]) {
        let end = bytes.len() - 4;
        let checksum = Checksum::Adler32.compute(&bytes[MAGIC.len()..end]);
        bytes[end..].copy_from_slice(&checksum.to_be_bytes());
    }

    #[test]
    fn test_oversized_extra_field_rejected() {
        let mut bytes = with_flags(Flags::H_EXTRA_FIELD);
        bytes.extend_from_slice(&0xFFFF_FFF0u32.to_be_bytes());
        let mut source = Cursor::new(bytes).chain(std::io::repeat(0).take(1 << 20));
        let err = LzopHeader::read(&mut source).unwrap_err();
        assert!(matches!(err, LzoError::InvalidHeader { .. }), "{err}");
        // nothing past the length field was pulled from the source
        let (_, rest) = source.into_inner();
        assert_eq!(rest.limit(), 1 << 20);
    }

    #[test]
    fn test_old_version_rejected() {
        let mut bytes = empty_txt_header().to_bytes().unwrap();
        bytes[9..11].copy_from_slice(&0x0800u16.to_be_bytes());
        reseal(&mut bytes);
        let err = LzopHeader::read(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, LzoError::UnsupportedVersion { version: 0x0800 }));
    }

    #[test]
    fn test_filtered_archive_rejected() {
        let mut bytes = with_flags(Flags::H_FILTER);
        // filter id follows the flags
        bytes.splice(21..21, 1u32.to_be_bytes());
        reseal(&mut bytes);
        let err = LzopHeader::read(&mut Cursor::new(bytes)).unwrap_err();
        assert!(
            matches!(&err, LzoError::InvalidHeader { message } if message.contains("filtered")),
            "{err}"
        );
    }

    #[test]
    fn test_multipart_archive_rejected() {
        let bytes = with_flags(Flags::MULTIPART);
        let err = LzopHeader::read(&mut Cursor::new(bytes)).unwrap_err();
        assert!(
            matches!(&err, LzoError::InvalidHeader { message } if message.contains("multi-part")),
            "{err}"
        );
    }

    #[test]
    fn test_stdin_archive_has_no_mode() {
        let bytes = with_flags(Flags::STDIN);
        let header = LzopHeader::read(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(header.mode, 0);
        assert_eq!(header.name, "empty.txt");
    }

    #[test]
    fn test_reserved_flags_rejected() {
        let mut bytes = empty_txt_header().to_bytes().unwrap();
        let flags = u32::from_be_bytes([bytes[17], bytes[18], bytes[19], bytes[20]]) | 0x0000_4000;
        bytes[17..21].copy_from_slice(&flags.to_be_bytes());
        let end = bytes.len() - 4;
        let checksum = Checksum::Adler32.compute(&bytes[MAGIC.len()..end]);
        bytes[end..].copy_from_slice(&checksum.to_be_bytes());
        let err = LzopHeader::read(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, LzoError::InvalidHeader { .. }));
    }

    #[test]
    fn test_name_too_long() {
        let header = LzopHeader::with_name("n".repeat(256));
        assert!(header.to_bytes().is_err());
    }

    #[test]
    fn test_flags_os() {
        let flags = Flags::ADLER32_D.with_os(OS_UNIX);
        assert_eq!(flags.bits(), 0x0300_0001);
        assert_eq!(flags.with_os(11).os(), 11);
    }
}
