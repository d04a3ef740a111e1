//! Streaming archive writer.

use crate::block::{BlockEncoder, END_OF_STREAM};
use crate::header::LzopHeader;
use crate::options::LzopOptions;
use log::debug;
use oxilzo_core::error::{LzoError, Result};
use oxilzo_lzo1x::Compressor;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Open,
    Closed,
    Failed,
}

/// Writes an lzop archive to an underlying sink.
///
/// Bytes are collected into blocks of the configured size. The header is
/// written when the first block is flushed (or on [`flush`](Write::flush) or
/// [`close`](LzopWriter::close)); until then the name, mtime and mode can
/// still be changed.
///
/// The archive is only complete once [`close`](LzopWriter::close) or
/// [`finish`](LzopWriter::finish) has written the end-of-stream record.
/// Dropping the writer without either leaves a truncated archive.
///
/// # Example
///
/// ```
/// use oxilzo_lzop::{LzopReader, LzopWriter};
/// use std::io::{Read, Write};
///
/// let mut writer = LzopWriter::new(Vec::new());
/// writer.set_name("greeting.txt").unwrap();
/// writer.write_all(b"hello world\n").unwrap();
/// let archive = writer.finish().unwrap();
///
/// let mut reader = LzopReader::new(&archive[..]).unwrap();
/// assert_eq!(reader.name(), "greeting.txt");
/// let mut text = String::new();
/// reader.read_to_string(&mut text).unwrap();
/// assert_eq!(text, "hello world\n");
/// ```
#[derive(Debug)]
pub struct LzopWriter<W: Write> {
    inner: W,
    header: LzopHeader,
    header_written: bool,
    block_size: usize,
    encoder: BlockEncoder,
    buffer: Vec<u8>,
    record: Vec<u8>,
    bytes_in: u64,
    bytes_out: u64,
    state: WriterState,
}

impl<W: Write> LzopWriter<W> {
    /// Create a writer with default options.
    pub fn new(inner: W) -> Self {
        let options = LzopOptions::default();
        let header = options.header();
        Self {
            inner,
            encoder: BlockEncoder::with_compressor(Compressor::default(), header.flags),
            header,
            header_written: false,
            block_size: options.block_size,
            buffer: Vec::new(),
            record: Vec::new(),
            bytes_in: 0,
            bytes_out: 0,
            state: WriterState::Open,
        }
    }

    /// Create a writer with the given options.
    pub fn with_options(inner: W, options: LzopOptions) -> Result<Self> {
        options.validate()?;
        let header = options.header();
        let encoder = BlockEncoder::new(header.method, header.flags)?;
        Ok(Self {
            inner,
            header,
            header_written: false,
            block_size: options.block_size,
            encoder,
            buffer: Vec::new(),
            record: Vec::new(),
            bytes_in: 0,
            bytes_out: 0,
            state: WriterState::Open,
        })
    }

    /// Header that is (or will be) written.
    pub fn header(&self) -> &LzopHeader {
        &self.header
    }

    /// Set the stored file name.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.check_header_pending("name")?;
        if name.len() > usize::from(u8::MAX) {
            return Err(LzoError::invalid_header(format!(
                "name is {} bytes, limit is 255",
                name.len()
            )));
        }
        self.header.name = name;
        Ok(())
    }

    /// Set the stored modification time, in seconds since the epoch.
    pub fn set_mtime(&mut self, mtime: u64) -> Result<()> {
        self.check_header_pending("mtime")?;
        self.header.mtime = mtime;
        Ok(())
    }

    /// Set the stored file mode.
    pub fn set_mode(&mut self, mode: u32) -> Result<()> {
        self.check_header_pending("mode")?;
        self.header.mode = mode;
        Ok(())
    }

    /// Uncompressed bytes accepted so far.
    pub fn total_in(&self) -> u64 {
        self.bytes_in
    }

    /// Archive bytes handed to the sink so far.
    pub fn total_out(&self) -> u64 {
        self.bytes_out
    }

    /// Reference to the sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutable reference to the sink.
    ///
    /// Writing to it directly corrupts the archive.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Flush the pending block, write the end-of-stream record and flush
    /// the sink.
    ///
    /// Calling it again after success does nothing.
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            WriterState::Closed => return Ok(()),
            WriterState::Failed => {
                return Err(LzoError::invalid_state("writer failed earlier"));
            }
            WriterState::Open => {}
        }
        self.guard(|w| {
            w.write_header()?;
            w.flush_block()?;
            w.inner.write_all(&END_OF_STREAM)?;
            w.bytes_out += END_OF_STREAM.len() as u64;
            w.inner.flush()?;
            Ok(())
        })?;
        self.state = WriterState::Closed;
        debug!(
            "closed lzop stream: {} bytes in, {} bytes out, {} blocks",
            self.bytes_in,
            self.bytes_out,
            self.encoder.blocks()
        );
        Ok(())
    }

    /// Close the archive and return the sink.
    pub fn finish(mut self) -> Result<W> {
        self.close()?;
        Ok(self.inner)
    }

    /// Buffer `buf`, flushing full blocks. Returns the bytes accepted.
    fn write_bytes(&mut self, buf: &[u8]) -> Result<usize> {
        self.check_open()?;
        if buf.is_empty() {
            return Ok(0);
        }
        if self.buffer.capacity() == 0 {
            self.buffer.reserve_exact(self.block_size);
        }
        let take = buf.len().min(self.block_size - self.buffer.len());
        self.buffer.extend_from_slice(&buf[..take]);
        self.bytes_in += take as u64;
        if self.buffer.len() == self.block_size {
            self.guard(|w| {
                w.write_header()?;
                w.flush_block()
            })?;
        }
        Ok(take)
    }

    fn flush_all(&mut self) -> Result<()> {
        self.check_open()?;
        self.guard(|w| {
            w.write_header()?;
            w.flush_block()?;
            w.inner.flush()?;
            Ok(())
        })
    }

    fn write_header(&mut self) -> Result<()> {
        if !self.header_written {
            let written = self.header.write(&mut self.inner)?;
            self.bytes_out += written as u64;
            self.header_written = true;
        }
        Ok(())
    }

    fn flush_block(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.encoder.encode(&self.buffer, &mut self.record);
        self.inner.write_all(&self.record)?;
        self.bytes_out += self.record.len() as u64;
        self.buffer.clear();
        Ok(())
    }

    /// Run `f`, poisoning the writer if it fails.
    fn guard(&mut self, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        let result = f(self);
        if result.is_err() {
            self.state = WriterState::Failed;
        }
        result
    }

    fn check_open(&self) -> Result<()> {
        match self.state {
            WriterState::Open => Ok(()),
            WriterState::Closed => Err(LzoError::invalid_state("writer is closed")),
            WriterState::Failed => Err(LzoError::invalid_state("writer failed earlier")),
        }
    }

    fn check_header_pending(&self, field: &str) -> Result<()> {
        if self.header_written {
            return Err(LzoError::invalid_state(format!(
                "cannot set {} after the header was written",
                field
            )));
        }
        Ok(())
    }
}

impl<W: Write> Write for LzopWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf).map_err(io::Error::from)
    }

    /// Write the header and any buffered bytes as a (possibly short) block.
    fn flush(&mut self) -> io::Result<()> {
        self.flush_all().map_err(io::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::DEFAULT_BLOCK_SIZE;

    /// Sink that fails every write after the first `limit` bytes.
    struct FailingSink {
        written: Vec<u8>,
        limit: usize,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.written.len() + buf.len() > self.limit {
                return Err(io::Error::other("sink full"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_empty_archive() {
        let archive = LzopWriter::new(Vec::new()).finish().unwrap();
        let header_len = LzopHeader::default().to_bytes().unwrap().len();
        assert_eq!(archive.len(), header_len + 4);
        assert_eq!(&archive[header_len..], END_OF_STREAM);
    }

    #[test]
    fn test_setters_fail_after_header() {
        let mut writer = LzopWriter::new(Vec::new());
        writer.set_name("a.txt").unwrap();
        writer.set_mtime(1234).unwrap();
        writer.set_mode(0o100600).unwrap();
        writer.flush().unwrap();
        assert!(matches!(
            writer.set_name("b.txt"),
            Err(LzoError::InvalidState { .. })
        ));
        assert!(writer.set_mtime(1).is_err());
        assert!(writer.set_mode(0).is_err());
        assert_eq!(writer.header().name, "a.txt");
    }

    #[test]
    fn test_blocks_split_at_block_size() {
        let options = LzopOptions::new().with_block_size(1000);
        let mut writer = LzopWriter::with_options(Vec::new(), options).unwrap();
        let data: Vec<u8> = (0..2500u32).map(|i| (i * 7 % 256) as u8).collect();
        for chunk in data.chunks(333) {
            writer.write_all(chunk).unwrap();
        }
        writer.close().unwrap();
        assert_eq!(writer.encoder.blocks(), 3);
        assert_eq!(writer.total_in(), 2500);
        assert_eq!(writer.total_out(), writer.get_ref().len() as u64);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut writer = LzopWriter::new(Vec::new());
        writer.write_all(b"abc").unwrap();
        writer.close().unwrap();
        let len = writer.get_ref().len();
        writer.close().unwrap();
        assert_eq!(writer.get_ref().len(), len);
        assert!(writer.write(b"more").is_err());
    }

    #[test]
    fn test_sink_failure_poisons_writer() {
        let sink = FailingSink {
            written: Vec::new(),
            limit: 60,
        };
        let options = LzopOptions::new().with_block_size(100);
        let mut writer = LzopWriter::with_options(sink, options).unwrap();
        // the header fits, the first record does not
        let err = writer.write_all(&[1u8; 100]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        let header_len = writer.header().to_bytes().unwrap().len();
        assert_eq!(writer.get_ref().written.len(), header_len);

        assert!(writer.write(b"x").is_err());
        assert!(matches!(
            writer.close(),
            Err(LzoError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_invalid_options() {
        let options = LzopOptions::new().with_block_size(0);
        assert!(LzopWriter::with_options(Vec::new(), options).is_err());
        assert_eq!(LzopOptions::default().block_size, DEFAULT_BLOCK_SIZE);
    }
}
