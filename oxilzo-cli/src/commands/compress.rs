//! Compress command implementation.

use crate::utils::{archive_path, create_output, file_mode, mtime_secs, same_file, savings};
use log::debug;
use oxilzo_core::Checksum;
use oxilzo_lzop::{CompressionLevel, LzopOptions, LzopWriter};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Options for the compress command.
pub struct CompressArgs {
    pub output: Option<PathBuf>,
    pub level: u8,
    pub block_size: usize,
    pub checksum: Checksum,
    pub compressed_checksum: bool,
    pub header_checksum: Checksum,
    pub force: bool,
    pub delete: bool,
}

impl CompressArgs {
    fn options_for(&self, input: &Path, metadata: &fs::Metadata) -> LzopOptions {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        LzopOptions::new()
            .with_level(CompressionLevel::new(self.level))
            .with_block_size(self.block_size)
            .with_checksum(self.checksum)
            .with_compressed_checksum(self.compressed_checksum)
            .with_header_checksum(self.header_checksum)
            .with_name(name)
            .with_mtime(mtime_secs(metadata))
            .with_mode(file_mode(metadata))
    }
}

pub fn cmd_compress(
    files: &[PathBuf],
    args: &CompressArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.output.is_some() && files.len() > 1 {
        return Err("--output requires a single input file".into());
    }

    for input in files {
        let output = args.output.clone().unwrap_or_else(|| archive_path(input));
        compress_file(input, &output, args)?;
        if args.delete {
            fs::remove_file(input)?;
            debug!("removed {}", input.display());
        }
    }
    Ok(())
}

fn compress_file(
    input: &Path,
    output: &Path,
    args: &CompressArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let metadata = fs::metadata(input)?;
    if !metadata.is_file() {
        return Err(format!("{}: not a regular file", input.display()).into());
    }
    if same_file(input, output) {
        return Err(format!("{}: output would overwrite the input", input.display()).into());
    }
    let options = args.options_for(input, &metadata);
    options.validate()?;

    let mut reader = BufReader::new(File::open(input)?);
    let sink = BufWriter::new(create_output(output, args.force)?);
    let mut writer = LzopWriter::with_options(sink, options)?;
    let result = io::copy(&mut reader, &mut writer)
        .map_err(oxilzo_core::error::unwrap_io)
        .and_then(|_| writer.close());
    if let Err(e) = result {
        // leave no partial archive behind
        drop(writer);
        let _ = fs::remove_file(output);
        return Err(e.into());
    }

    debug!(
        "{}: {} -> {} bytes",
        input.display(),
        writer.total_in(),
        writer.total_out()
    );
    println!(
        "{} -> {} ({:.1}% saved)",
        input.display(),
        output.display(),
        savings(writer.total_in(), writer.total_out())
    );
    Ok(())
}
