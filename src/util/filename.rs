//! Database file naming conventions.
//!
//! All numbered files draw from a single monotonic 64-bit space managed
//! by the version set: tables, logs and manifests never share a number.

use std::path::{Path, PathBuf};

/// File types in the database directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Write-ahead log file.
    Log,
    /// Immutable sorted table file.
    Table,
    /// Manifest file (version edit history).
    Manifest,
    /// Current file (points to the active manifest).
    Current,
    /// Temporary file.
    Temp,
}

/// Generate the current file path.
pub fn current_file_path(db_path: &Path) -> PathBuf {
    db_path.join("CURRENT")
}

/// Generate a manifest file path.
pub fn manifest_file_path(db_path: &Path, number: u64) -> PathBuf {
    db_path.join(manifest_file_name(number))
}

/// Generate a manifest file name.
pub fn manifest_file_name(number: u64) -> String {
    format!("MANIFEST-{:06}", number)
}

/// Generate a log (WAL) file path.
pub fn log_file_path(db_path: &Path, number: u64) -> PathBuf {
    db_path.join(format!("{:06}.log", number))
}

/// Generate a sorted table file path.
pub fn table_file_path(db_path: &Path, number: u64) -> PathBuf {
    db_path.join(format!("{:06}.ldb", number))
}

/// Generate a temporary file path.
pub fn temp_file_path(db_path: &Path, number: u64) -> PathBuf {
    db_path.join(format!("{:06}.tmp", number))
}

/// Parse a file name and return its type and number.
///
/// Returns `None` if the file name doesn't match any known pattern.
pub fn parse_file_name(name: &str) -> Option<(FileType, u64)> {
    if name == "CURRENT" {
        return Some((FileType::Current, 0));
    }

    if let Some(suffix) = name.strip_prefix("MANIFEST-") {
        if let Ok(number) = suffix.parse::<u64>() {
            return Some((FileType::Manifest, number));
        }
        return None;
    }

    if let Some(dot_pos) = name.rfind('.') {
        let (num_str, ext) = name.split_at(dot_pos);
        let ext = &ext[1..];

        if let Ok(number) = num_str.parse::<u64>() {
            let file_type = match ext {
                "log" => FileType::Log,
                "ldb" => FileType::Table,
                "tmp" => FileType::Temp,
                _ => return None,
            };
            return Some((file_type, number));
        }
    }

    None
}

/// Atomically point CURRENT at the given manifest.
///
/// Writes a temp file, syncs it, then renames it over CURRENT so a crash
/// never leaves a partially written pointer.
pub fn set_current_file(db_path: &Path, manifest_number: u64) -> std::io::Result<()> {
    let current_path = current_file_path(db_path);
    let temp_path = temp_file_path(db_path, manifest_number);

    std::fs::write(&temp_path, format!("{}\n", manifest_file_name(manifest_number)))?;

    let file = std::fs::File::open(&temp_path)?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(&temp_path, &current_path)
}

/// Read the manifest name recorded in CURRENT.
pub fn read_current_file(db_path: &Path) -> std::io::Result<String> {
    let content = std::fs::read_to_string(current_file_path(db_path))?;
    Ok(content.trim().to_string())
}

/// Delete a file, ignoring "not found" errors.
pub fn delete_file(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
