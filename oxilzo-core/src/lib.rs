//! # OxiLZO Core
//!
//! Core components shared by the OxiLZO crates.
//!
//! - [`checksum`]: Adler-32 and CRC-32, incremental or one-shot
//! - [`error`]: the error taxonomy every layer reports through
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ CLI: oxilzo (compress / decompress / test / list)       │
//! ├─────────────────────────────────────────────────────────┤
//! │ Container: oxilzo-lzop                                  │
//! │     header codec, block framer, Writer/Reader adapters │
//! ├─────────────────────────────────────────────────────────┤
//! │ Codec: oxilzo-lzo1x                                     │
//! │     LZO1X-1 encoder, instruction decoder               │
//! ├─────────────────────────────────────────────────────────┤
//! │ Core (this crate)                                       │
//! │     checksums, errors                                  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxilzo_core::checksum::{Checksum, Crc32};
//!
//! let crc = Crc32::compute(b"Hello, World!");
//! assert_eq!(crc, 0xEC4AC3D0);
//!
//! let mut running = Checksum::Adler32.hasher();
//! running.update(b"Wiki");
//! running.update(b"pedia");
//! assert_eq!(running.value(), 0x11E60398);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod checksum;
pub mod error;

// Re-exports for convenience
pub use checksum::{Adler32, Checksum, Crc32, RunningChecksum};
pub use error::{LzoError, Result};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::checksum::{Adler32, Checksum, Crc32, RunningChecksum};
    pub use crate::error::{LzoError, Result};
}
