//! OxiLZO CLI - lzop-compatible compression in Pure Rust.

mod commands;
mod utils;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use commands::{
    CompressArgs, DecompressArgs, cmd_compress, cmd_decompress, cmd_list, cmd_test,
};
use log::LevelFilter;
use oxilzo_core::Checksum;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oxilzo")]
#[command(author, version, about = "Pure Rust lzop-compatible compressor")]
#[command(long_about = "
OxiLZO reads and writes lzop (.lzo) files using LZO1X compression.

Examples:
  oxilzo compress notes.txt
  oxilzo compress -l 1 --checksum crc32 big.log
  oxilzo decompress notes.txt.lzo
  oxilzo test notes.txt.lzo
  oxilzo list --json notes.txt.lzo
")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress files into .lzo archives
    #[command(alias = "c")]
    Compress {
        /// Files to compress
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output file (single input only)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compression level (1 = fastest)
        #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=9))]
        level: u8,

        /// Block size in KiB
        #[arg(short, long, default_value_t = 256)]
        block_size: usize,

        /// Block checksum algorithm
        #[arg(long, value_enum, default_value = "adler32")]
        checksum: ChecksumArg,

        /// Also checksum compressed block payloads
        #[arg(long)]
        compressed_checksum: bool,

        /// Protect the header with CRC-32 instead of Adler-32
        #[arg(long)]
        header_crc32: bool,

        /// Overwrite existing output files
        #[arg(short, long)]
        force: bool,

        /// Delete input files after successful compression
        #[arg(long)]
        delete: bool,
    },

    /// Decompress .lzo archives
    #[command(aliases = ["d", "x"])]
    Decompress {
        /// Archives to decompress
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output file (single input only)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Name the output after the name stored in the archive
        #[arg(short = 'N', long)]
        stored_name: bool,

        /// Overwrite existing output files
        #[arg(short, long)]
        force: bool,

        /// Do not restore the stored modification time
        #[arg(long)]
        no_mtime: bool,

        /// Delete archives after successful decompression
        #[arg(long)]
        delete: bool,
    },

    /// Test archive integrity
    #[command(alias = "t")]
    Test {
        /// Archives to test
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List archive contents
    #[command(alias = "l")]
    List {
        /// Archives to list
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },
}

/// Block checksum algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ChecksumArg {
    /// Adler-32 (lzop default)
    Adler32,
    /// CRC-32
    Crc32,
}

impl From<ChecksumArg> for Checksum {
    fn from(arg: ChecksumArg) -> Self {
        match arg {
            ChecksumArg::Adler32 => Checksum::Adler32,
            ChecksumArg::Crc32 => Checksum::Crc32,
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default.as_str()))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compress {
            files,
            output,
            level,
            block_size,
            checksum,
            compressed_checksum,
            header_crc32,
            force,
            delete,
        } => cmd_compress(
            &files,
            &CompressArgs {
                output,
                level,
                block_size: block_size.saturating_mul(1024),
                checksum: checksum.into(),
                compressed_checksum,
                header_checksum: if header_crc32 {
                    Checksum::Crc32
                } else {
                    Checksum::Adler32
                },
                force,
                delete,
            },
        ),
        Commands::Decompress {
            files,
            output,
            stored_name,
            force,
            no_mtime,
            delete,
        } => cmd_decompress(
            &files,
            &DecompressArgs {
                output,
                stored_name,
                force,
                restore_mtime: !no_mtime,
                delete,
            },
        ),
        Commands::Test { files } => cmd_test(&files),
        Commands::List { files, json } => cmd_list(&files, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
