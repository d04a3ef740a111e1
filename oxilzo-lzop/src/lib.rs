//! lzop archive format.
//!
//! An lzop archive is a header (magic, versions, method, flags, file name,
//! mode and mtime, protected by a checksum) followed by independently
//! compressed LZO1X blocks, each carrying its own lengths and checksums, and
//! a zero-length record marking the end.
//!
//! # Features
//!
//! - Streaming [`LzopWriter`] / [`LzopReader`] over `std::io`
//! - Archives byte-identical to `lzop -5` (LZO1X-1) and `lzop -1` (LZO1X-1(15))
//! - Adler-32 or CRC-32 header, data and payload checksums
//! - Reads legacy headers and LZO1X-999 archives
//! - `parallel` feature: rayon block compression
//! - `async-io` feature: tokio front-ends
//!
//! # Example
//!
//! ```
//! use oxilzo_lzop::{LzopOptions, compress, decompress};
//!
//! let data = b"Hello, World! Hello, World! Hello, World! Hello, World!";
//! let archive = compress(data, &LzopOptions::new().with_name("hello.txt")).unwrap();
//! assert_eq!(decompress(&archive).unwrap(), data);
//! ```

#![warn(missing_docs)]

#[cfg(feature = "async-io")]
pub mod async_io;
pub mod block;
pub mod header;
mod options;
#[cfg(feature = "parallel")]
mod parallel;
mod reader;
mod writer;

pub use block::{BlockDecoder, BlockEncoder, DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE};
pub use header::{Flags, LzopHeader, MAGIC, Method};
pub use options::{CompressionLevel, LzopOptions};
pub use reader::LzopReader;
pub use writer::LzopWriter;

#[cfg(feature = "async-io")]
pub use async_io::{compress_async, decompress_async};
#[cfg(feature = "parallel")]
pub use parallel::compress_parallel;

use oxilzo_core::error::{Result, unwrap_io};
use std::io::Write;

/// Compress `data` into an in-memory archive.
pub fn compress(data: &[u8], options: &LzopOptions) -> Result<Vec<u8>> {
    let mut writer = LzopWriter::with_options(Vec::new(), options.clone())?;
    writer.write_all(data).map_err(unwrap_io)?;
    writer.finish()
}

/// Decompress an in-memory archive.
pub fn decompress(archive: &[u8]) -> Result<Vec<u8>> {
    decompress_with_header(archive).map(|(_, data)| data)
}

/// Decompress an in-memory archive, also returning its header.
pub fn decompress_with_header(archive: &[u8]) -> Result<(LzopHeader, Vec<u8>)> {
    let mut reader = LzopReader::new(archive)?;
    let mut out = Vec::new();
    while let Some(block) = reader.read_block()? {
        out.extend_from_slice(block);
    }
    Ok((reader.header().clone(), out))
}

/// True if `data` starts with the lzop magic.
pub fn is_lzop(data: &[u8]) -> bool {
    data.starts_with(&MAGIC)
}
