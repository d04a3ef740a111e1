//! Decompress command implementation.

use crate::utils::{create_output, extracted_path, same_file};
use filetime::FileTime;
use log::{debug, warn};
use oxilzo_lzop::{LzopHeader, LzopReader};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Options for the decompress command.
pub struct DecompressArgs {
    pub output: Option<PathBuf>,
    pub stored_name: bool,
    pub force: bool,
    pub restore_mtime: bool,
    pub delete: bool,
}

pub fn cmd_decompress(
    files: &[PathBuf],
    args: &DecompressArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.output.is_some() && files.len() > 1 {
        return Err("--output requires a single input file".into());
    }

    for archive in files {
        decompress_file(archive, args)?;
        if args.delete {
            fs::remove_file(archive)?;
            debug!("removed {}", archive.display());
        }
    }
    Ok(())
}

fn decompress_file(
    archive: &Path,
    args: &DecompressArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = LzopReader::new(BufReader::new(File::open(archive)?))?;
    let output = match &args.output {
        Some(path) => path.clone(),
        None => {
            let stored = args.stored_name.then(|| reader.name());
            extracted_path(archive, stored)
        }
    };

    if same_file(archive, &output) {
        return Err(format!("{}: output would overwrite the archive", archive.display()).into());
    }
    let mut sink = BufWriter::new(create_output(&output, args.force)?);
    let result = io::copy(&mut reader, &mut sink).and_then(|_| sink.flush());
    if let Err(e) = result {
        drop(sink);
        let _ = fs::remove_file(&output);
        return Err(oxilzo_core::error::unwrap_io(e).into());
    }
    drop(sink);

    restore_metadata(&output, reader.header(), args.restore_mtime);
    println!(
        "{} -> {} ({} bytes)",
        archive.display(),
        output.display(),
        reader.uncompressed_bytes()
    );
    Ok(())
}

/// Apply the stored mode and mtime. Failures only warn; the data is intact.
fn restore_metadata(path: &Path, header: &LzopHeader, restore_mtime: bool) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if header.mode != 0 {
            let permissions = fs::Permissions::from_mode(header.mode & 0o7777);
            if let Err(e) = fs::set_permissions(path, permissions) {
                warn!("{}: cannot set mode {:o}: {}", path.display(), header.mode, e);
            }
        }
    }

    if restore_mtime && header.mtime != 0 {
        let mtime = FileTime::from_unix_time(header.mtime as i64, 0);
        if let Err(e) = filetime::set_file_mtime(path, mtime) {
            warn!("{}: cannot set mtime: {}", path.display(), e);
        }
    }
}
