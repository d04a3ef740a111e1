//! Streaming archive reader.

use crate::block::BlockDecoder;
use crate::header::LzopHeader;
use log::debug;
use oxilzo_core::error::{LzoError, Result};
use std::io::{self, Read};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    Reading,
    Finished,
    Failed,
    Closed,
}

/// Reads an lzop archive from an underlying source.
///
/// The header is parsed and verified by [`new`](LzopReader::new). Blocks are
/// decoded one at a time as data is pulled; each block's checksums are
/// verified before any of its bytes are returned. A read returns 0 only
/// after the end-of-stream record; a source that ends early is an error.
#[derive(Debug)]
pub struct LzopReader<R: Read> {
    inner: R,
    header: LzopHeader,
    decoder: BlockDecoder,
    block: Vec<u8>,
    pos: usize,
    state: ReaderState,
}

impl<R: Read> LzopReader<R> {
    /// Parse the archive header from `inner`.
    pub fn new(mut inner: R) -> Result<Self> {
        let header = LzopHeader::read(&mut inner)?;
        let decoder = BlockDecoder::new(header.flags);
        Ok(Self {
            inner,
            header,
            decoder,
            block: Vec::new(),
            pos: 0,
            state: ReaderState::Reading,
        })
    }

    /// The parsed header.
    pub fn header(&self) -> &LzopHeader {
        &self.header
    }

    /// Stored file name; empty when none was recorded.
    pub fn name(&self) -> &str {
        &self.header.name
    }

    /// Stored modification time in seconds since the epoch.
    pub fn mtime(&self) -> u64 {
        self.header.mtime
    }

    /// Stored file mode.
    pub fn mode(&self) -> u32 {
        self.header.mode
    }

    /// Blocks decoded so far.
    pub fn blocks(&self) -> u64 {
        self.decoder.blocks()
    }

    /// Payload bytes of the blocks decoded so far.
    pub fn compressed_bytes(&self) -> u64 {
        self.decoder.compressed_bytes()
    }

    /// Bytes produced by the blocks decoded so far.
    pub fn uncompressed_bytes(&self) -> u64 {
        self.decoder.uncompressed_bytes()
    }

    /// True once the end-of-stream record has been read.
    pub fn is_finished(&self) -> bool {
        self.state == ReaderState::Finished
    }

    /// Return the rest of the current block, or the next decoded block.
    ///
    /// `Ok(None)` means the end-of-stream record was reached.
    pub fn read_block(&mut self) -> Result<Option<&[u8]>> {
        if self.pos < self.block.len() {
            let start = self.pos;
            self.pos = self.block.len();
            return Ok(Some(&self.block[start..]));
        }
        if !self.fill_block()? {
            return Ok(None);
        }
        self.pos = self.block.len();
        Ok(Some(&self.block))
    }

    /// Release the block buffer. Later reads fail; closing again does
    /// nothing.
    pub fn close(&mut self) {
        if self.state != ReaderState::Closed {
            self.block = Vec::new();
            self.pos = 0;
            self.state = ReaderState::Closed;
        }
    }

    /// Reference to the source.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Return the source, positioned after the last record read.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Decode the next block into the buffer. Returns `false` at the end of
    /// the stream.
    fn fill_block(&mut self) -> Result<bool> {
        match self.state {
            ReaderState::Reading => {}
            ReaderState::Finished => return Ok(false),
            ReaderState::Failed => {
                return Err(LzoError::invalid_state("reader failed earlier"));
            }
            ReaderState::Closed => return Err(LzoError::invalid_state("reader is closed")),
        }

        self.pos = 0;
        match self.decoder.read_block(&mut self.inner, &mut self.block) {
            Ok(true) => Ok(true),
            Ok(false) => {
                self.state = ReaderState::Finished;
                debug!(
                    "finished lzop stream {:?}: {} blocks, {} bytes from {}",
                    self.header.name,
                    self.decoder.blocks(),
                    self.decoder.uncompressed_bytes(),
                    self.decoder.compressed_bytes()
                );
                Ok(false)
            }
            Err(err) => {
                self.block.clear();
                self.state = ReaderState::Failed;
                Err(err)
            }
        }
    }
}

impl<R: Read> Read for LzopReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.pos == self.block.len() {
            if !self.fill_block().map_err(io::Error::from)? {
                return Ok(0);
            }
        }
        let n = buf.len().min(self.block.len() - self.pos);
        buf[..n].copy_from_slice(&self.block[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::LzopOptions;
    use crate::writer::LzopWriter;
    use oxilzo_core::error::unwrap_io;
    use std::io::Write;

    fn archive(data: &[u8], block_size: usize) -> Vec<u8> {
        let options = LzopOptions::new()
            .with_name("data.bin")
            .with_mtime(1_700_000_000)
            .with_block_size(block_size);
        let mut writer = LzopWriter::with_options(Vec::new(), options).unwrap();
        writer.write_all(data).unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn test_header_properties() {
        let bytes = archive(b"payload", 1024);
        let reader = LzopReader::new(&bytes[..]).unwrap();
        assert_eq!(reader.name(), "data.bin");
        assert_eq!(reader.mtime(), 1_700_000_000);
        assert_eq!(reader.mode(), 0o100644);
    }

    #[test]
    fn test_read_blocks() {
        let data: Vec<u8> = (0..2500u32).map(|i| (i % 13) as u8).collect();
        let bytes = archive(&data, 1000);
        let mut reader = LzopReader::new(&bytes[..]).unwrap();
        let mut sizes = Vec::new();
        let mut out = Vec::new();
        while let Some(block) = reader.read_block().unwrap() {
            sizes.push(block.len());
            out.extend_from_slice(block);
        }
        assert_eq!(sizes, [1000, 1000, 500]);
        assert_eq!(out, data);
        assert!(reader.is_finished());
        assert_eq!(reader.blocks(), 3);
        assert_eq!(reader.uncompressed_bytes(), 2500);
        assert!(reader.read_block().unwrap().is_none());
    }

    #[test]
    fn test_read_block_returns_unread_remainder() {
        let bytes = archive(b"0123456789", 1024);
        let mut reader = LzopReader::new(&bytes[..]).unwrap();
        let mut head = [0u8; 4];
        reader.read_exact(&mut head).unwrap();
        assert_eq!(reader.read_block().unwrap(), Some(&b"456789"[..]));
        assert_eq!(reader.read_block().unwrap(), None);
    }

    #[test]
    fn test_small_reads() {
        let data = b"the quick brown fox jumps over the lazy dog ".repeat(100);
        let bytes = archive(&data, 333);
        let mut reader = LzopReader::new(&bytes[..]).unwrap();
        let mut out = Vec::new();
        let mut buf = [0u8; 7];
        loop {
            let n = reader.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, data);
    }

    #[test]
    fn test_close_is_idempotent() {
        let bytes = archive(b"abc", 1024);
        let mut reader = LzopReader::new(&bytes[..]).unwrap();
        reader.close();
        reader.close();
        assert!(matches!(
            reader.read_block(),
            Err(LzoError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_error_poisons_reader() {
        let mut bytes = archive(b"hello world\n", 1024);
        let last = bytes.len() - 5;
        bytes[last] ^= 0x01;
        let mut reader = LzopReader::new(&bytes[..]).unwrap();
        let err = reader.read_block().unwrap_err();
        assert!(err.is_checksum_error());
        assert!(matches!(
            reader.read_block(),
            Err(LzoError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_read_error_carries_lzo_error() {
        let bytes = archive(b"hello world\n", 1024);
        let cut = &bytes[..bytes.len() - 4];
        let mut reader = LzopReader::new(cut).unwrap();
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(matches!(unwrap_io(err), LzoError::Truncated { .. }));
    }

    #[test]
    fn test_into_inner_after_end() {
        let mut bytes = archive(b"abc", 1024);
        bytes.extend_from_slice(b"trailer");
        let mut reader = LzopReader::new(&bytes[..]).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(reader.into_inner(), b"trailer");
    }
}
