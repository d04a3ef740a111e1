//! List command implementation.

use crate::utils::{format_mtime, savings};
use oxilzo_lzop::{LzopHeader, LzopReader};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// JSON serializable description of one archive.
#[derive(Debug, Serialize)]
struct ArchiveJson {
    archive: String,
    name: String,
    method: String,
    level: u8,
    size: u64,
    compressed_size: u64,
    archive_size: u64,
    ratio: f64,
    blocks: u64,
    mtime: u64,
    mode: u32,
    flags: u32,
}

struct ArchiveSummary {
    header: LzopHeader,
    size: u64,
    compressed_size: u64,
    archive_size: u64,
    blocks: u64,
}

fn summarize(archive: &Path) -> Result<ArchiveSummary, oxilzo_core::LzoError> {
    let archive_size = fs::metadata(archive)?.len();
    let mut reader = LzopReader::new(BufReader::new(File::open(archive)?))?;
    io::copy(&mut reader, &mut io::sink()).map_err(oxilzo_core::error::unwrap_io)?;
    Ok(ArchiveSummary {
        header: reader.header().clone(),
        size: reader.uncompressed_bytes(),
        compressed_size: reader.compressed_bytes(),
        archive_size,
        blocks: reader.blocks(),
    })
}

pub fn cmd_list(files: &[PathBuf], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut summaries = Vec::with_capacity(files.len());
    for archive in files {
        summaries.push((archive, summarize(archive)?));
    }

    if json {
        let entries: Vec<ArchiveJson> = summaries
            .iter()
            .map(|(archive, s)| ArchiveJson {
                archive: archive.display().to_string(),
                name: s.header.name.clone(),
                method: s.header.method.name().to_string(),
                level: s.header.level,
                size: s.size,
                compressed_size: s.compressed_size,
                archive_size: s.archive_size,
                ratio: savings(s.size, s.archive_size),
                blocks: s.blocks,
                mtime: s.header.mtime,
                mode: s.header.mode,
                flags: s.header.flags.bits(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!(
        "{:<10} {:>10} {:>10} {:>6}  {:<19}  Name",
        "Method", "Packed", "Size", "Ratio", "Date"
    );
    println!("{}", "-".repeat(72));
    let mut total_size = 0u64;
    let mut total_packed = 0u64;
    for (archive, s) in &summaries {
        let name = if s.header.name.is_empty() {
            archive.display().to_string()
        } else {
            s.header.name.clone()
        };
        println!(
            "{:<10} {:>10} {:>10} {:>5.1}%  {:<19}  {}",
            s.header.method.name(),
            s.archive_size,
            s.size,
            savings(s.size, s.archive_size),
            format_mtime(s.header.mtime),
            name
        );
        total_size += s.size;
        total_packed += s.archive_size;
    }
    if summaries.len() > 1 {
        println!("{}", "-".repeat(72));
        println!(
            "{:<10} {:>10} {:>10} {:>5.1}%  {:<19}  {} files",
            "",
            total_packed,
            total_size,
            savings(total_size, total_packed),
            "",
            summaries.len()
        );
    }
    Ok(())
}
