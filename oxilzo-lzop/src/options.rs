//! Writer configuration.

use crate::block::{DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE};
use crate::header::{Flags, LzopHeader, Method, OS_UNIX};
use oxilzo_core::checksum::Checksum;
use oxilzo_core::error::{LzoError, Result};

/// Compression level, 1 (fastest) to 9.
///
/// Level 1 selects LZO1X-1(15); every other level selects LZO1X-1. The
/// level itself is recorded in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// Fastest level.
    pub const FASTEST: Self = Self(1);
    /// Level written by default.
    pub const DEFAULT: Self = Self(5);
    /// Highest level.
    pub const BEST: Self = Self(9);

    /// Create a level, clamping to `1..=9`.
    pub fn new(level: u8) -> Self {
        Self(level.clamp(1, 9))
    }

    /// Numeric level.
    pub fn level(self) -> u8 {
        self.0
    }

    /// Method used to compress at this level.
    pub fn method(self) -> Method {
        if self.0 == 1 {
            Method::Lzo1x1_15
        } else {
            Method::Lzo1x1
        }
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Options for writing an archive.
///
/// The defaults reproduce what `lzop` writes for a regular file: level 5,
/// Adler-32 block and header checksums, Unix OS code, mode `0o100644`.
///
/// # Example
///
/// ```
/// use oxilzo_core::Checksum;
/// use oxilzo_lzop::{CompressionLevel, LzopOptions};
///
/// let options = LzopOptions::new()
///     .with_name("notes.txt")
///     .with_level(CompressionLevel::new(3))
///     .with_checksum(Checksum::Crc32)
///     .with_block_size(64 * 1024);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LzopOptions {
    /// Maximum uncompressed bytes per block.
    pub block_size: usize,
    /// Compression level.
    pub level: CompressionLevel,
    /// Checksum of each block's uncompressed data.
    pub checksum: Checksum,
    /// Also checksum the compressed payload of compressed blocks.
    pub compressed_checksum: bool,
    /// Checksum protecting the header.
    pub header_checksum: Checksum,
    /// Original file name.
    pub name: String,
    /// Modification time in seconds since the epoch.
    pub mtime: u64,
    /// Unix mode of the original file.
    pub mode: u32,
    /// Operating system code.
    pub os: u8,
}

impl Default for LzopOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            level: CompressionLevel::DEFAULT,
            checksum: Checksum::Adler32,
            compressed_checksum: false,
            header_checksum: Checksum::Adler32,
            name: String::new(),
            mtime: 0,
            mode: 0o100644,
            os: OS_UNIX,
        }
    }
}

impl LzopOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the block size.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the compression level.
    pub fn with_level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the block data checksum.
    pub fn with_checksum(mut self, checksum: Checksum) -> Self {
        self.checksum = checksum;
        self
    }

    /// Enable or disable checksums of compressed payloads.
    pub fn with_compressed_checksum(mut self, enabled: bool) -> Self {
        self.compressed_checksum = enabled;
        self
    }

    /// Set the header checksum.
    pub fn with_header_checksum(mut self, checksum: Checksum) -> Self {
        self.header_checksum = checksum;
        self
    }

    /// Set the original file name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the modification time.
    pub fn with_mtime(mut self, mtime: u64) -> Self {
        self.mtime = mtime;
        self
    }

    /// Set the file mode.
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Set the operating system code.
    pub fn with_os(mut self, os: u8) -> Self {
        self.os = os;
        self
    }

    /// Check the options can produce a valid archive.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(LzoError::invalid_state(format!(
                "block size {} is outside 1..={}",
                self.block_size, MAX_BLOCK_SIZE
            )));
        }
        if self.name.len() > usize::from(u8::MAX) {
            return Err(LzoError::invalid_header(format!(
                "name is {} bytes, limit is 255",
                self.name.len()
            )));
        }
        Ok(())
    }

    /// Header flags implied by these options.
    pub fn flags(&self) -> Flags {
        let mut flags = match self.checksum {
            Checksum::Adler32 => Flags::ADLER32_D,
            Checksum::Crc32 => Flags::CRC32_D,
        };
        if self.compressed_checksum {
            flags |= match self.checksum {
                Checksum::Adler32 => Flags::ADLER32_C,
                Checksum::Crc32 => Flags::CRC32_C,
            };
        }
        if self.header_checksum == Checksum::Crc32 {
            flags |= Flags::H_CRC32;
        }
        flags.with_os(self.os)
    }

    /// Header these options describe.
    pub fn header(&self) -> LzopHeader {
        LzopHeader {
            method: self.level.method(),
            level: self.level.level(),
            flags: self.flags(),
            mode: self.mode,
            mtime: self.mtime,
            name: self.name.clone(),
            ..LzopHeader::default()
        }
    }
}
