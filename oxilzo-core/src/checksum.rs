//! Checksum engine for lzop archives.
//!
//! Two interchangeable 32-bit checksums are used by the format:
//!
//! - **Adler-32**: seed 1, modulus 65521 (the zlib `adler32()` value)
//! - **CRC-32 (ISO 3309)**: reflected polynomial 0xEDB88320, the zlib
//!   `crc32()` value
//!
//! Both expose the same incremental `update` / `value` shape so callers can
//! checksum header bytes and block payloads without buffering the input.
//! [`RunningChecksum`] dispatches over whichever algorithm the archive flags
//! select.
//!
//! ## Performance
//!
//! CRC-32 uses the "slicing-by-8" technique for data ≥16 bytes, processing
//! 8 bytes at a time with 8 pre-computed lookup tables. Adler-32 is
//! delegated to `simd-adler32`, which dispatches to AVX2/SSSE3/NEON kernels
//! at runtime.

use std::fmt;

/// CRC-32 slicing-by-8 lookup tables (polynomial 0xEDB88320, reflected).
/// Table 0 is the classic byte-at-a-time table.
const CRC32_TABLE_SLICE: [[u32; 256]; 8] = {
    let mut tables = [[0u32; 256]; 8];

    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB88320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        tables[0][i] = crc;
        i += 1;
    }

    let mut t = 1;
    while t < 8 {
        let mut i = 0usize;
        while i < 256 {
            let prev = tables[t - 1][i];
            tables[t][i] = tables[0][(prev & 0xFF) as usize] ^ (prev >> 8);
            i += 1;
        }
        t += 1;
    }

    tables
};

/// CRC-32 calculator (ISO 3309).
///
/// - Polynomial: 0x04C11DB7 (reflected: 0xEDB88320)
/// - Initial value: 0xFFFFFFFF
/// - Final XOR: 0xFFFFFFFF
///
/// The finalized value equals lzop's `lzo_crc32(0, ..)` running value, so a
/// fresh calculator is the format's CRC seed.
///
/// # Example
///
/// ```
/// use oxilzo_core::checksum::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"Hello, World!");
/// assert_eq!(crc.finalize(), 0xEC4AC3D0);
/// ```
#[derive(Debug, Clone)]
pub struct Crc32 {
    crc: u32,
}

impl Crc32 {
    /// Create a new CRC-32 calculator.
    pub fn new() -> Self {
        Self { crc: 0xFFFFFFFF }
    }

    /// Reset the CRC to its initial state.
    pub fn reset(&mut self) {
        self.crc = 0xFFFFFFFF;
    }

    /// Update the CRC with more data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        if data.len() >= 16 {
            crc32_slice8(&mut self.crc, data);
        } else {
            crc32_sw(&mut self.crc, data);
        }
    }

    /// Get the current CRC value (without finalizing).
    #[inline(always)]
    pub fn value(&self) -> u32 {
        self.crc ^ 0xFFFFFFFF
    }

    /// Finalize and return the CRC value.
    #[inline(always)]
    pub fn finalize(self) -> u32 {
        self.value()
    }

    /// Compute CRC-32 for a slice in one call.
    #[inline]
    pub fn compute(data: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(data);
        crc.finalize()
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn crc32_sw(crc: &mut u32, data: &[u8]) {
    for &byte in data {
        let index = ((*crc ^ byte as u32) & 0xFF) as usize;
        *crc = CRC32_TABLE_SLICE[0][index] ^ (*crc >> 8);
    }
}

#[inline]
fn crc32_slice8(crc: &mut u32, data: &[u8]) {
    let mut c = *crc;
    let mut chunks = data.chunks_exact(8);

    for bytes in &mut chunks {
        let crc_xor = c ^ u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let b0 = (crc_xor & 0xFF) as usize;
        let b1 = ((crc_xor >> 8) & 0xFF) as usize;
        let b2 = ((crc_xor >> 16) & 0xFF) as usize;
        let b3 = ((crc_xor >> 24) & 0xFF) as usize;

        c = CRC32_TABLE_SLICE[7][b0]
            ^ CRC32_TABLE_SLICE[6][b1]
            ^ CRC32_TABLE_SLICE[5][b2]
            ^ CRC32_TABLE_SLICE[4][b3]
            ^ CRC32_TABLE_SLICE[3][bytes[4] as usize]
            ^ CRC32_TABLE_SLICE[2][bytes[5] as usize]
            ^ CRC32_TABLE_SLICE[1][bytes[6] as usize]
            ^ CRC32_TABLE_SLICE[0][bytes[7] as usize];
    }

    *crc = c;
    crc32_sw(crc, chunks.remainder());
}

/// Adler-32 calculator.
///
/// Seeded with 1 as the format requires. Backed by `simd-adler32`.
///
/// # Example
///
/// ```
/// use oxilzo_core::checksum::Adler32;
///
/// assert_eq!(Adler32::compute(b"Wikipedia"), 0x11E60398);
/// ```
#[derive(Clone)]
pub struct Adler32 {
    inner: simd_adler32::Adler32,
}

impl Adler32 {
    /// Create a new Adler-32 calculator.
    pub fn new() -> Self {
        Self {
            inner: simd_adler32::Adler32::new(),
        }
    }

    /// Reset to the seed value.
    pub fn reset(&mut self) {
        self.inner = simd_adler32::Adler32::new();
    }

    /// Update the checksum with more data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.inner.write(data);
    }

    /// Get the current checksum value.
    #[inline]
    pub fn value(&self) -> u32 {
        self.inner.finish()
    }

    /// Compute Adler-32 for a slice in one call.
    pub fn compute(data: &[u8]) -> u32 {
        let mut adler = Self::new();
        adler.update(data);
        adler.value()
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Adler32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adler32")
            .field("value", &self.value())
            .finish()
    }
}

/// Checksum algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Checksum {
    /// Adler-32 (the format default).
    #[default]
    Adler32,
    /// CRC-32 (ISO 3309).
    Crc32,
}

impl Checksum {
    /// Compute this checksum over `data` in one call.
    pub fn compute(self, data: &[u8]) -> u32 {
        match self {
            Self::Adler32 => Adler32::compute(data),
            Self::Crc32 => Crc32::compute(data),
        }
    }

    /// Start an incremental computation.
    pub fn hasher(self) -> RunningChecksum {
        RunningChecksum::new(self)
    }

    /// Human-readable algorithm name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Adler32 => "Adler-32",
            Self::Crc32 => "CRC-32",
        }
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An in-progress checksum of either algorithm.
#[derive(Debug, Clone)]
pub enum RunningChecksum {
    /// Adler-32 state.
    Adler32(Adler32),
    /// CRC-32 state.
    Crc32(Crc32),
}

impl RunningChecksum {
    /// Start a checksum with the algorithm's seed value.
    pub fn new(kind: Checksum) -> Self {
        match kind {
            Checksum::Adler32 => Self::Adler32(Adler32::new()),
            Checksum::Crc32 => Self::Crc32(Crc32::new()),
        }
    }

    /// Fold more bytes into the checksum.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Adler32(a) => a.update(data),
            Self::Crc32(c) => c.update(data),
        }
    }

    /// Current digest.
    #[inline]
    pub fn value(&self) -> u32 {
        match self {
            Self::Adler32(a) => a.value(),
            Self::Crc32(c) => c.value(),
        }
    }

    /// Which algorithm this state belongs to.
    pub fn kind(&self) -> Checksum {
        match self {
            Self::Adler32(_) => Checksum::Adler32,
            Self::Crc32(_) => Checksum::Crc32,
        }
    }
}
