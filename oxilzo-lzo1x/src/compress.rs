//! LZO1X-1 compressor.
//!
//! Greedy single pass over the input. A hash of the next four bytes indexes
//! a dictionary holding the most recent position with that hash; a candidate
//! is accepted only when its four bytes match exactly, then extended as far
//! as it goes. Positions that do not match are skipped with a stride that
//! grows with the length of the current literal run, so incompressible
//! input is passed over quickly.
//!
//! Input is processed in 48 KiB segments and the dictionary is cleared for
//! each one, which keeps every back-reference within the M4 window and makes
//! the output independent of leftover dictionary contents. Pending literals
//! carry over from one segment to the next.

use crate::instruction::{END_MARKER, push_literals, push_match};

/// Input segment processed with one dictionary generation.
const SEGMENT_SIZE: usize = 49152;

/// Tail of each segment that is never searched for matches.
const SEGMENT_TAIL: usize = 20;

/// Multiplier of the four-byte dictionary hash.
const HASH_MULTIPLIER: u32 = 0x1824_429d;

/// Dictionary size selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    /// `LZO1X-1`: 2^14 dictionary entries.
    #[default]
    Lzo1x1,
    /// `LZO1X-1(15)`: 2^15 dictionary entries.
    Lzo1x1_15,
}

impl Variant {
    /// log2 of the dictionary size.
    pub fn dict_bits(self) -> u32 {
        match self {
            Self::Lzo1x1 => 14,
            Self::Lzo1x1_15 => 15,
        }
    }
}

/// Worst-case compressed size for `input_len` bytes.
pub fn compress_bound(input_len: usize) -> usize {
    input_len + input_len / 16 + 64 + 3
}

/// Compress `input` into a fresh buffer.
///
/// # Example
///
/// ```
/// use oxilzo_lzo1x::{compress, decompress};
///
/// let data = b"abcabcabcabcabcabcabcabcabcabcabcabcabcabcabc";
/// let packed = compress(data);
/// assert!(packed.len() < data.len());
/// assert_eq!(decompress(&packed, data.len()).unwrap(), data);
/// ```
pub fn compress(input: &[u8]) -> Vec<u8> {
    Compressor::new(Variant::default()).compress(input)
}

/// Reusable LZO1X-1 compressor.
///
/// Owns its dictionary so repeated calls do not reallocate it.
#[derive(Debug, Clone)]
pub struct Compressor {
    dict_bits: u32,
    dict: Vec<u16>,
}

impl Compressor {
    /// Create a compressor for the given variant.
    pub fn new(variant: Variant) -> Self {
        let dict_bits = variant.dict_bits();
        Self {
            dict_bits,
            dict: vec![0; 1 << dict_bits],
        }
    }

    /// Compress `input` into a fresh buffer.
    pub fn compress(&mut self, input: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(compress_bound(input.len()));
        self.compress_into(input, &mut out);
        out
    }

    /// Compress `input`, appending the instruction stream to `out`.
    pub fn compress_into(&mut self, input: &[u8], out: &mut Vec<u8>) {
        let out_start = out.len();
        let mut pos = 0;
        let mut remaining = input.len();
        let mut pending = 0;

        while remaining > SEGMENT_TAIL {
            let len = remaining.min(SEGMENT_SIZE);
            if (pending + len) >> 5 == 0 {
                break;
            }
            self.dict.fill(0);
            pending = self.compress_segment(input, pos, len, pending, out);
            pos += len;
            remaining -= len;
        }
        pending += remaining;

        let tail = &input[input.len() - pending..];
        push_literals(out, tail, out.len() == out_start);
        out.extend_from_slice(&END_MARKER);
    }

    #[inline(always)]
    fn hash(&self, word: u32) -> usize {
        (word.wrapping_mul(HASH_MULTIPLIER) >> (32 - self.dict_bits)) as usize
    }

    /// Compress one segment `input[base..base + len]`.
    ///
    /// `carried` literals immediately before `base` are still pending from
    /// the previous segment. Returns the number of literals left pending at
    /// the end of this segment.
    fn compress_segment(
        &mut self,
        input: &[u8],
        base: usize,
        len: usize,
        carried: usize,
        out: &mut Vec<u8>,
    ) -> usize {
        let seg_end = base + len;
        let search_end = seg_end - SEGMENT_TAIL;
        let mut carried = carried;
        let mut anchor = base;
        let mut ip = base + 4usize.saturating_sub(carried);

        'literal: loop {
            ip += 1 + ((ip - anchor) >> 5);

            loop {
                if ip >= search_end {
                    break 'literal;
                }

                let word = read_u32(input, ip);
                let slot = self.hash(word);
                let candidate = base + usize::from(self.dict[slot]);
                self.dict[slot] = (ip - base) as u16;
                if word != read_u32(input, candidate) {
                    continue 'literal;
                }

                anchor -= carried;
                carried = 0;
                push_literals(out, &input[anchor..ip], false);

                let len = match_length(input, ip, candidate, search_end);
                let distance = ip - candidate;
                ip += len;
                anchor = ip;
                push_match(out, len, distance);
            }
        }

        seg_end - (anchor - carried)
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(Variant::default())
    }
}

#[inline(always)]
fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

#[inline(always)]
fn read_u64(data: &[u8], pos: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&data[pos..pos + 8]);
    u64::from_le_bytes(word)
}

/// Length of the match at `ip` against `candidate`, whose first four bytes
/// are already known to agree.
///
/// Compares eight bytes at a time. Once a full word matches, the run stops
/// growing as soon as it reaches `search_end`, so a match may run a few
/// bytes past it but never past the segment tail.
#[inline]
fn match_length(input: &[u8], ip: usize, candidate: usize, search_end: usize) -> usize {
    let mut len = 4;
    loop {
        let diff = read_u64(input, ip + len) ^ read_u64(input, candidate + len);
        if diff != 0 {
            return len + (diff.trailing_zeros() / 8) as usize;
        }
        len += 8;
        if ip + len >= search_end {
            return len;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_empty() {
        assert_eq!(compress(b""), END_MARKER);
    }

    #[test]
    fn test_compress_short_literal_only() {
        let mut expected = vec![17 + 12];
        expected.extend_from_slice(b"hello world\n");
        expected.extend_from_slice(&END_MARKER);
        assert_eq!(compress(b"hello world\n"), expected);
    }

    #[test]
    fn test_compress_two_lines_too_short_to_search() {
        let data = b"hello world\nhello world\n";
        let packed = compress(data);
        assert_eq!(packed[0], 17 + 24);
        assert_eq!(&packed[1..25], data);
        assert_eq!(&packed[25..], END_MARKER);
    }

    #[test]
    fn test_compress_run_of_one_byte() {
        let packed = compress(&[b'a'; 100]);
        let mut expected = vec![0x02, b'a', b'a', b'a', b'a', b'a'];
        // M3: length 76 at distance 5, then a 19-byte literal run
        expected.extend_from_slice(&[0x20, 0x2b, 0x10, 0x00]);
        expected.extend_from_slice(&[0x00, 0x01]);
        expected.extend_from_slice(&[b'a'; 19]);
        expected.extend_from_slice(&END_MARKER);
        assert_eq!(packed, expected);
    }

    #[test]
    fn test_compress_counting_bytes() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1024).collect();
        let packed = compress(&data);
        assert_eq!(packed.len(), 288);
        // first instruction: a 261-byte literal run, encoded 0, 261 - 18
        assert_eq!(&packed[..4], &[0x00, 0xf3, 0x00, 0x01]);
    }

    #[test]
    fn test_deterministic() {
        let data: Vec<u8> = (0..200_000u32).map(|i| ((i * 31) % 251) as u8).collect();
        assert_eq!(compress(&data), compress(&data));

        let mut reused = Compressor::default();
        let first = reused.compress(&data);
        let second = reused.compress(&data);
        assert_eq!(first, second);
    }

    #[test]
    fn test_bound_holds_for_random() {
        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
        let data: Vec<u8> = (0..100_000)
            .map(|_| {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
                (seed >> 33) as u8
            })
            .collect();
        for variant in [Variant::Lzo1x1, Variant::Lzo1x1_15] {
            let packed = Compressor::new(variant).compress(&data);
            assert!(packed.len() <= compress_bound(data.len()));
        }
    }

    #[test]
    fn test_compress_into_appends() {
        let mut out = vec![0xAA, 0xBB];
        Compressor::default().compress_into(b"xyz", &mut out);
        assert_eq!(out, [0xAA, 0xBB, 17 + 3, b'x', b'y', b'z', 0x11, 0x00, 0x00]);
    }

    #[test]
    fn test_hash_in_range() {
        for variant in [Variant::Lzo1x1, Variant::Lzo1x1_15] {
            let c = Compressor::new(variant);
            for word in [0u32, 1, 0x12345678, u32::MAX] {
                assert!(c.hash(word) < c.dict.len());
            }
        }
    }
}
