//! Utility functions for the CLI.

use chrono::DateTime;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Archive extension written by `compress`.
pub const LZO_EXTENSION: &str = "lzo";

/// Default archive path for `input`: the input path with `.lzo` appended.
pub fn archive_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".");
    name.push(LZO_EXTENSION);
    PathBuf::from(name)
}

/// Default output path for `archive`.
///
/// `x.lzo` becomes `x`, `x.tzo` becomes `x.tar`; anything else gets `.out`
/// appended. With `stored_name`, the archive's recorded name (without any
/// directory part) is used next to the archive instead.
pub fn extracted_path(archive: &Path, stored_name: Option<&str>) -> PathBuf {
    if let Some(name) = stored_name.and_then(|n| Path::new(n).file_name()) {
        return archive.with_file_name(name);
    }
    match archive.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(LZO_EXTENSION) => archive.with_extension(""),
        Some(ext) if ext.eq_ignore_ascii_case("tzo") => archive.with_extension("tar"),
        _ => {
            let mut name = archive.as_os_str().to_os_string();
            name.push(".out");
            PathBuf::from(name)
        }
    }
}

/// Create `path` for writing, refusing to replace an existing file unless
/// `force` is set.
pub fn create_output(path: &Path, force: bool) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    options.open(path)
}

/// True if `a` and `b` name the same existing file.
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Modification time of `metadata` in seconds since the epoch, or 0.
pub fn mtime_secs(metadata: &std::fs::Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Unix mode of `metadata`, or a regular `0644` file elsewhere.
#[cfg(unix)]
pub fn file_mode(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

/// Unix mode of `metadata`, or a regular `0644` file elsewhere.
#[cfg(not(unix))]
pub fn file_mode(_metadata: &std::fs::Metadata) -> u32 {
    0o100644
}

/// Space saved, as a percentage of `size`.
pub fn savings(size: u64, packed: u64) -> f64 {
    if size == 0 {
        0.0
    } else {
        (1.0 - packed as f64 / size as f64) * 100.0
    }
}

/// Format seconds since the epoch as `YYYY-MM-DD HH:MM:SS` (UTC).
///
/// Times chrono cannot represent are shown as raw seconds.
pub fn format_mtime(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| secs.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_path() {
        assert_eq!(archive_path(Path::new("a/b.txt")), PathBuf::from("a/b.txt.lzo"));
    }

    #[test]
    fn test_extracted_path() {
        assert_eq!(
            extracted_path(Path::new("dir/notes.txt.lzo"), None),
            PathBuf::from("dir/notes.txt")
        );
        assert_eq!(
            extracted_path(Path::new("backup.tzo"), None),
            PathBuf::from("backup.tar")
        );
        assert_eq!(
            extracted_path(Path::new("data.bin"), None),
            PathBuf::from("data.bin.out")
        );
        assert_eq!(
            extracted_path(Path::new("dir/x.lzo"), Some("../../etc/hello.txt")),
            PathBuf::from("dir/hello.txt")
        );
        assert_eq!(
            extracted_path(Path::new("dir/x.lzo"), Some("")),
            PathBuf::from("dir/x")
        );
    }

    #[test]
    fn test_same_file() {
        let dir = std::env::temp_dir().join(format!("oxilzo_same_file_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("input.txt");
        fs::write(&path, b"data").unwrap();

        assert!(same_file(&path, &dir.join(".").join("input.txt")));
        assert!(!same_file(&path, &dir.join("input.txt.lzo")));
        assert!(!same_file(&dir.join("missing"), &dir.join("missing")));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_savings() {
        assert_eq!(savings(0, 10), 0.0);
        assert_eq!(savings(200, 50), 75.0);
    }

    #[test]
    fn test_format_mtime() {
        assert_eq!(format_mtime(0), "1970-01-01 00:00:00");
        // hello.txt in the reference archives
        assert_eq!(format_mtime(0x51cf_8a0f), "2013-06-30 01:29:51");
        assert_eq!(format_mtime(951_782_400), "2000-02-29 00:00:00");
        assert_eq!(format_mtime(u64::MAX), u64::MAX.to_string());
    }
}
