//! Error types for OxiLZO operations.
//!
//! Every failure a stream can hit is fatal for that stream. The variants are
//! grouped the way callers usually need to tell them apart: header/format
//! problems, integrity failures, truncated input, and malformed compressed
//! instruction streams.

use std::io;
use thiserror::Error;

/// The main error type for OxiLZO operations.
#[derive(Debug, Error)]
pub enum LzoError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid magic cookie at the start of an archive.
    #[error("Invalid magic number: expected {expected:02x?}, found {found:02x?}")]
    InvalidMagic {
        /// Expected magic bytes.
        expected: Vec<u8>,
        /// Actual magic bytes found.
        found: Vec<u8>,
    },

    /// Archive requires a format version this library cannot read.
    #[error("Unsupported archive version {version:#06x}")]
    UnsupportedVersion {
        /// The offending version field.
        version: u16,
    },

    /// Unsupported compression method.
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// The compression method identifier.
        method: u8,
    },

    /// Invalid header field or header layout.
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the header error.
        message: String,
    },

    /// Header checksum mismatch.
    #[error("Header checksum mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    HeaderChecksum {
        /// Checksum stored in the archive.
        expected: u32,
        /// Checksum computed over the header bytes.
        computed: u32,
    },

    /// Block checksum mismatch.
    #[error("{what} checksum mismatch in block {block}: expected {expected:#010x}, computed {computed:#010x}")]
    BlockChecksum {
        /// Zero-based index of the block.
        block: u64,
        /// Which checksum failed (e.g. "uncompressed Adler-32").
        what: &'static str,
        /// Checksum stored in the archive.
        expected: u32,
        /// Checksum computed over the block data.
        computed: u32,
    },

    /// The source ended before a declared length was satisfied.
    #[error("Unexpected end of stream while reading {context}")]
    Truncated {
        /// What was being read when the stream ended.
        context: &'static str,
    },

    /// Malformed LZO1X instruction stream.
    #[error("Malformed instruction at offset {offset}: {message}")]
    MalformedInstruction {
        /// Byte offset into the compressed block.
        offset: usize,
        /// Description of the problem.
        message: String,
    },

    /// Block record metadata is inconsistent.
    #[error("Corrupted block {block}: {message}")]
    CorruptedBlock {
        /// Zero-based index of the block.
        block: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Operation is not valid for the current stream state.
    #[error("Invalid stream state: {message}")]
    InvalidState {
        /// Description of the state error.
        message: String,
    },
}

/// Result type alias for OxiLZO operations.
pub type Result<T> = std::result::Result<T, LzoError>;

impl LzoError {
    /// Create an invalid magic error.
    pub fn invalid_magic(expected: impl Into<Vec<u8>>, found: impl Into<Vec<u8>>) -> Self {
        Self::InvalidMagic {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create a header checksum error.
    pub fn header_checksum(expected: u32, computed: u32) -> Self {
        Self::HeaderChecksum { expected, computed }
    }

    /// Create a block checksum error.
    pub fn block_checksum(block: u64, what: &'static str, expected: u32, computed: u32) -> Self {
        Self::BlockChecksum {
            block,
            what,
            expected,
            computed,
        }
    }

    /// Create a truncated stream error.
    pub fn truncated(context: &'static str) -> Self {
        Self::Truncated { context }
    }

    /// Create a malformed instruction error.
    pub fn malformed(offset: usize, message: impl Into<String>) -> Self {
        Self::MalformedInstruction {
            offset,
            message: message.into(),
        }
    }

    /// Create a corrupted block error.
    pub fn corrupted(block: u64, message: impl Into<String>) -> Self {
        Self::CorruptedBlock {
            block,
            message: message.into(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Map an I/O error from `read_exact`, turning a premature EOF into
    /// [`LzoError::Truncated`].
    pub fn from_read(err: io::Error, context: &'static str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::truncated(context)
        } else {
            Self::Io(err)
        }
    }

    /// True for the integrity failures (header or block checksum mismatch).
    pub fn is_checksum_error(&self) -> bool {
        matches!(self, Self::HeaderChecksum { .. } | Self::BlockChecksum { .. })
    }

    /// True for malformed headers: bad magic, unsupported version, method or layout.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagic { .. }
                | Self::UnsupportedVersion { .. }
                | Self::UnsupportedMethod { .. }
                | Self::InvalidHeader { .. }
        )
    }
}

impl From<LzoError> for io::Error {
    fn from(err: LzoError) -> Self {
        match err {
            LzoError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

/// Recover an [`LzoError`] that was wrapped into an `io::Error`.
///
/// Errors produced by the `Read`/`Write` adapters carry the original error as
/// their inner value; anything else becomes [`LzoError::Io`].
pub fn unwrap_io(err: io::Error) -> LzoError {
    if err.get_ref().is_some_and(|inner| inner.is::<LzoError>()) {
        match err.into_inner().map(|inner| inner.downcast::<LzoError>()) {
            Some(Ok(lzo)) => *lzo,
            Some(Err(other)) => LzoError::Io(io::Error::new(io::ErrorKind::InvalidData, other)),
            None => LzoError::invalid_state("empty I/O error"),
        }
    } else {
        LzoError::Io(err)
    }
}
