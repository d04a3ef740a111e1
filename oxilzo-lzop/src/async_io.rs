//! Async front-ends over tokio I/O (requires the `async-io` feature).
//!
//! These drive the same header codec and block framer as the blocking
//! [`LzopWriter`](crate::LzopWriter) / [`LzopReader`](crate::LzopReader);
//! only the I/O is asynchronous. Compression and decompression of a block
//! still run on the calling task.
//!
//! # Example
//!
//! ```rust,ignore
//! use oxilzo_lzop::{LzopOptions, compress_async, decompress_async};
//!
//! let mut archive = Vec::new();
//! compress_async(&mut &b"hello world\n"[..], &mut archive, &LzopOptions::default()).await?;
//!
//! let mut text = Vec::new();
//! let header = decompress_async(&mut &archive[..], &mut text).await?;
//! ```

use crate::block::{BlockDecoder, BlockEncoder, END_OF_STREAM};
use crate::header::{LzopHeader, Parsed};
use crate::options::LzopOptions;
use log::debug;
use oxilzo_core::error::{LzoError, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Compress everything `input` yields into an archive written to `output`.
///
/// Returns the number of archive bytes written. The output is identical to
/// what [`compress`](crate::compress) produces for the same data.
pub async fn compress_async<R, W>(
    input: &mut R,
    output: &mut W,
    options: &LzopOptions,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    options.validate()?;
    let header = options.header();
    let mut encoder = BlockEncoder::new(header.method, header.flags)?;

    let header_bytes = header.to_bytes()?;
    output.write_all(&header_bytes).await?;
    let mut written = header_bytes.len() as u64;

    let mut buffer = vec![0u8; options.block_size];
    let mut record = Vec::new();
    loop {
        let filled = fill(input, &mut buffer).await?;
        if filled == 0 {
            break;
        }
        encoder.encode(&buffer[..filled], &mut record);
        output.write_all(&record).await?;
        written += record.len() as u64;
        if filled < buffer.len() {
            break;
        }
    }

    output.write_all(&END_OF_STREAM).await?;
    output.flush().await?;
    written += END_OF_STREAM.len() as u64;
    debug!(
        "async compression wrote {} bytes in {} blocks",
        written,
        encoder.blocks()
    );
    Ok(written)
}

/// Decompress the archive `input` yields, writing the data to `output`.
///
/// Returns the archive header.
pub async fn decompress_async<R, W>(input: &mut R, output: &mut W) -> Result<LzopHeader>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let header = read_header(input).await?;
    let mut decoder = BlockDecoder::new(header.flags);
    let mut record = Vec::new();
    let mut block = Vec::new();

    loop {
        let dst = read_be32(input).await?;
        if dst == 0 {
            break;
        }
        let src = read_be32(input).await?;
        let layout = decoder.layout(dst, src)?;
        record.resize(layout.record_len, 0);
        input
            .read_exact(&mut record)
            .await
            .map_err(|e| LzoError::from_read(e, "block data"))?;
        decoder.decode(&layout, &record, &mut block)?;
        output.write_all(&block).await?;
    }
    output.flush().await?;

    debug!(
        "async decompression of {:?}: {} blocks, {} bytes",
        header.name,
        decoder.blocks(),
        decoder.uncompressed_bytes()
    );
    Ok(header)
}

async fn read_header<R: AsyncRead + Unpin>(input: &mut R) -> Result<LzopHeader> {
    let mut buf = Vec::with_capacity(64);
    loop {
        match LzopHeader::parse(&buf)? {
            Parsed::Complete(header, _) => return Ok(header),
            Parsed::Incomplete(needed) => {
                let missing = (needed - buf.len()) as u64;
                (&mut *input).take(missing).read_to_end(&mut buf).await?;
                if buf.len() < needed {
                    LzopHeader::parse(&buf)?;
                    return Err(LzoError::truncated("archive header"));
                }
            }
        }
    }
}

async fn read_be32<R: AsyncRead + Unpin>(input: &mut R) -> Result<u32> {
    input
        .read_u32()
        .await
        .map_err(|e| LzoError::from_read(e, "block header"))
}

/// Read until `buf` is full or the source ends. Returns the bytes read.
async fn fill<R: AsyncRead + Unpin>(input: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = input.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
