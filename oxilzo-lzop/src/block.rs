//! Block framing.
//!
//! After the header an archive is a sequence of block records:
//!
//! ```text
//! +------------+------------+-------------------+---------------------+---------+
//! | dst len u32| src len u32| data checksum(s)  | payload checksum(s) | payload |
//! +------------+------------+-------------------+---------------------+---------+
//! ```
//!
//! `dst` is the uncompressed length and `src` the payload length. When
//! `src == dst` the payload is stored raw and carries no payload checksums.
//! A record with `dst == 0` ends the stream and has no further fields.
//! Checksum fields appear in flag order: Adler-32 before CRC-32.

use crate::header::{Flags, Method};
use log::{trace, warn};
use oxilzo_core::checksum::Checksum;
use oxilzo_core::error::{LzoError, Result};
use oxilzo_lzo1x::{Compressor, decompress_into};
use std::io::Read;

/// Default maximum uncompressed bytes per block (256 KiB).
pub const DEFAULT_BLOCK_SIZE: usize = 256 * 1024;

/// Largest uncompressed block accepted (64 MiB).
pub const MAX_BLOCK_SIZE: usize = 64 * 1024 * 1024;

/// `dst` value marking a split-file continuation.
pub const SPLIT_MARKER: u32 = 0xFFFF_FFFF;

/// The end-of-stream record.
pub const END_OF_STREAM: [u8; 4] = [0; 4];

#[derive(Debug, Clone, Copy)]
struct ChecksumField {
    flag: Flags,
    kind: Checksum,
    what: &'static str,
}

const DATA_CHECKSUMS: [ChecksumField; 2] = [
    ChecksumField {
        flag: Flags::ADLER32_D,
        kind: Checksum::Adler32,
        what: "uncompressed Adler-32",
    },
    ChecksumField {
        flag: Flags::CRC32_D,
        kind: Checksum::Crc32,
        what: "uncompressed CRC-32",
    },
];

const PAYLOAD_CHECKSUMS: [ChecksumField; 2] = [
    ChecksumField {
        flag: Flags::ADLER32_C,
        kind: Checksum::Adler32,
        what: "compressed Adler-32",
    },
    ChecksumField {
        flag: Flags::CRC32_C,
        kind: Checksum::Crc32,
        what: "compressed CRC-32",
    },
];

fn field_count(flags: Flags, table: &[ChecksumField; 2]) -> usize {
    table.iter().filter(|f| flags.contains(f.flag)).count()
}

/// Append one block record for `data` to `record`.
///
/// `scratch` receives the candidate compressed payload. The payload is kept
/// only when it is strictly shorter than `data`.
pub(crate) fn encode_record(
    compressor: &mut Compressor,
    flags: Flags,
    data: &[u8],
    scratch: &mut Vec<u8>,
    record: &mut Vec<u8>,
) -> bool {
    scratch.clear();
    compressor.compress_into(data, scratch);
    let compressed = scratch.len() < data.len();
    let payload: &[u8] = if compressed { &scratch[..] } else { data };

    record.extend_from_slice(&(data.len() as u32).to_be_bytes());
    record.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    for field in DATA_CHECKSUMS.iter().filter(|f| flags.contains(f.flag)) {
        record.extend_from_slice(&field.kind.compute(data).to_be_bytes());
    }
    if compressed {
        for field in PAYLOAD_CHECKSUMS.iter().filter(|f| flags.contains(f.flag)) {
            record.extend_from_slice(&field.kind.compute(payload).to_be_bytes());
        }
    }
    record.extend_from_slice(payload);
    compressed
}

/// Write side of the block framer.
#[derive(Debug)]
pub struct BlockEncoder {
    compressor: Compressor,
    flags: Flags,
    scratch: Vec<u8>,
    blocks: u64,
}

impl BlockEncoder {
    /// Create an encoder for `method`, writing the checksums `flags` selects.
    pub fn new(method: Method, flags: Flags) -> Result<Self> {
        let variant = method.variant().ok_or(LzoError::UnsupportedMethod {
            method: method as u8,
        })?;
        Ok(Self::with_compressor(Compressor::new(variant), flags))
    }

    pub(crate) fn with_compressor(compressor: Compressor, flags: Flags) -> Self {
        Self {
            compressor,
            flags,
            scratch: Vec::new(),
            blocks: 0,
        }
    }

    /// Number of records encoded so far.
    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    /// Replace the contents of `record` with the record for `data`.
    ///
    /// Empty `data` has no record (a zero length would end the stream), so
    /// `record` is left empty.
    pub fn encode(&mut self, data: &[u8], record: &mut Vec<u8>) {
        record.clear();
        if data.is_empty() {
            return;
        }
        let compressed = encode_record(
            &mut self.compressor,
            self.flags,
            data,
            &mut self.scratch,
            record,
        );
        trace!(
            "block {}: {} bytes {} as {} bytes",
            self.blocks,
            data.len(),
            if compressed { "compressed" } else { "stored" },
            record.len()
        );
        self.blocks += 1;
    }
}

/// Validated block metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockLayout {
    /// Uncompressed length.
    pub uncompressed: usize,
    /// Payload length.
    pub compressed: usize,
    /// Bytes following the two length fields: checksums and payload.
    pub record_len: usize,
}

impl BlockLayout {
    fn is_compressed(&self) -> bool {
        self.compressed < self.uncompressed
    }
}

/// Read side of the block framer.
#[derive(Debug)]
pub struct BlockDecoder {
    flags: Flags,
    blocks: u64,
    compressed_bytes: u64,
    uncompressed_bytes: u64,
    record: Vec<u8>,
}

impl BlockDecoder {
    /// Create a decoder for an archive with the given header flags.
    pub fn new(flags: Flags) -> Self {
        Self {
            flags,
            blocks: 0,
            compressed_bytes: 0,
            uncompressed_bytes: 0,
            record: Vec::new(),
        }
    }

    /// Number of blocks decoded.
    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    /// Payload bytes consumed by decoded blocks.
    pub fn compressed_bytes(&self) -> u64 {
        self.compressed_bytes
    }

    /// Bytes produced by decoded blocks.
    pub fn uncompressed_bytes(&self) -> u64 {
        self.uncompressed_bytes
    }

    /// Read the next record into `out`, replacing its contents.
    ///
    /// Returns `false` once the end-of-stream record has been read. A source
    /// that ends anywhere else is [`LzoError::Truncated`].
    pub fn read_block<R: Read>(&mut self, reader: &mut R, out: &mut Vec<u8>) -> Result<bool> {
        let dst = read_be32(reader)?;
        if dst == 0 {
            out.clear();
            trace!("end of stream after {} blocks", self.blocks);
            return Ok(false);
        }
        let src = read_be32(reader)?;
        let layout = self.layout(dst, src)?;

        let mut record = std::mem::take(&mut self.record);
        record.resize(layout.record_len, 0);
        let result = reader
            .read_exact(&mut record)
            .map_err(|e| LzoError::from_read(e, "block data"))
            .and_then(|()| self.decode(&layout, &record, out));
        self.record = record;
        result.map(|()| true)
    }

    /// Validate the two length fields of a record that is not the end marker.
    pub(crate) fn layout(&self, dst: u32, src: u32) -> Result<BlockLayout> {
        if dst == SPLIT_MARKER {
            return Err(self.corruption("split archives are not supported".to_string()));
        }
        let uncompressed = dst as usize;
        let compressed = src as usize;
        if uncompressed > MAX_BLOCK_SIZE {
            return Err(self.corruption(format!(
                "block of {} bytes exceeds the {} byte limit",
                uncompressed, MAX_BLOCK_SIZE
            )));
        }
        if compressed == 0 || compressed > uncompressed {
            return Err(self.corruption(format!(
                "payload of {} bytes for a {} byte block",
                compressed, uncompressed
            )));
        }

        let mut checksums = field_count(self.flags, &DATA_CHECKSUMS);
        if compressed < uncompressed {
            checksums += field_count(self.flags, &PAYLOAD_CHECKSUMS);
        }
        Ok(BlockLayout {
            uncompressed,
            compressed,
            record_len: checksums * 4 + compressed,
        })
    }

    /// Verify and decode the checksums and payload of one record.
    pub(crate) fn decode(
        &mut self,
        layout: &BlockLayout,
        record: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<()> {
        if record.len() != layout.record_len {
            return Err(LzoError::invalid_state(format!(
                "record holds {} bytes, layout needs {}",
                record.len(),
                layout.record_len
            )));
        }

        let mut pos = 0;
        let flags = self.flags;
        let data_sums =
            DATA_CHECKSUMS.map(|f| flags.contains(f.flag).then(|| be32_at(record, &mut pos)));
        let payload_sums = PAYLOAD_CHECKSUMS.map(|f| {
            (layout.is_compressed() && flags.contains(f.flag)).then(|| be32_at(record, &mut pos))
        });
        let payload = &record[pos..];

        if layout.is_compressed() {
            self.verify(&PAYLOAD_CHECKSUMS, &payload_sums, payload)?;
            if let Err(err) = decompress_into(payload, layout.uncompressed, out) {
                warn!("block {}: {}", self.blocks, err);
                return Err(err);
            }
        } else {
            out.clear();
            out.extend_from_slice(payload);
        }
        self.verify(&DATA_CHECKSUMS, &data_sums, out)?;

        trace!(
            "block {}: {} bytes from {} byte payload",
            self.blocks, layout.uncompressed, layout.compressed
        );
        self.blocks += 1;
        self.compressed_bytes += layout.compressed as u64;
        self.uncompressed_bytes += layout.uncompressed as u64;
        Ok(())
    }

    fn verify(
        &self,
        table: &[ChecksumField; 2],
        stored: &[Option<u32>; 2],
        data: &[u8],
    ) -> Result<()> {
        for (field, stored) in table.iter().zip(stored) {
            let Some(expected) = *stored else { continue };
            let computed = field.kind.compute(data);
            if computed != expected {
                warn!(
                    "block {}: {} mismatch, stored {:#010x}, computed {:#010x}",
                    self.blocks, field.what, expected, computed
                );
                return Err(LzoError::block_checksum(
                    self.blocks,
                    field.what,
                    expected,
                    computed,
                ));
            }
        }
        Ok(())
    }

    fn corruption(&self, message: String) -> LzoError {
        warn!("block {}: {}", self.blocks, message);
        LzoError::corrupted(self.blocks, message)
    }
}

fn read_be32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|e| LzoError::from_read(e, "block header"))?;
    Ok(u32::from_be_bytes(buf))
}

/// Big-endian u32 at `*pos`; the caller has checked the record length.
fn be32_at(record: &[u8], pos: &mut usize) -> u32 {
    let b = &record[*pos..*pos + 4];
    *pos += 4;
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}
