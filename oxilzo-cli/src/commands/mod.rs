//! Command implementations for OxiLZO CLI.

pub mod compress;
pub mod decompress;
pub mod list;

pub use compress::{CompressArgs, cmd_compress};
pub use decompress::{DecompressArgs, cmd_decompress};
pub use list::cmd_list;
pub use test::cmd_test;
