//! Pure Rust LZO1X compression.
//!
//! LZO1X is a byte-oriented LZ77 variant built for decompression speed. A
//! compressed block is a stream of literal runs and back-references with
//! no entropy coding; this crate provides the raw block codec used inside
//! lzop archives.
//!
//! # Features
//!
//! - LZO1X-1 and LZO1X-1(15) compression, bit-exact with liblzo2
//! - Decompression of any LZO1X stream, with bounds checking on every copy
//! - The instruction model ([`instruction`]) is public for inspection and
//!   testing of individual opcodes
//!
//! # Example
//!
//! ```
//! use oxilzo_lzo1x::{Compressor, Variant, decompress};
//!
//! let data = b"Hello, World! Hello, World! Hello, World! Hello, World!";
//! let mut compressor = Compressor::new(Variant::Lzo1x1);
//! let packed = compressor.compress(data);
//! let unpacked = decompress(&packed, data.len()).unwrap();
//! assert_eq!(unpacked, data);
//! ```

#![warn(missing_docs)]

mod compress;
mod decompress;
pub mod instruction;

pub use compress::{Compressor, Variant, compress, compress_bound};
pub use decompress::{decompress, decompress_into};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_empty() {
        let packed = compress(b"");
        assert_eq!(decompress(&packed, 0).unwrap(), b"");
    }

    #[test]
    fn test_roundtrip_text() {
        let data = b"It was the best of times, it was the worst of times, \
                     it was the age of wisdom, it was the age of foolishness";
        let packed = compress(data);
        assert!(packed.len() < data.len());
        assert_eq!(decompress(&packed, data.len()).unwrap(), data);
    }

    #[test]
    fn test_roundtrip_both_variants() {
        let data: Vec<u8> = (0..300_000u32).map(|i| (i % 97) as u8 ^ (i >> 11) as u8).collect();
        for variant in [Variant::Lzo1x1, Variant::Lzo1x1_15] {
            let packed = Compressor::new(variant).compress(&data);
            assert_eq!(decompress(&packed, data.len()).unwrap(), data);
        }
    }
}
