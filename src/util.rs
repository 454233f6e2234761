//! File helpers shared by the deck store, the history log and config.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{QuickfireError, Result};

/// Maximum deck or log size that will be read into memory (10 MB).
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Read a file into a string, refusing files over `MAX_FILE_SIZE`.
pub fn read_to_string_limited(path: &Path) -> Result<String> {
    read_to_string_with_limit(path, MAX_FILE_SIZE)
}

/// Read a file into a string, refusing files over `max_size` bytes.
pub fn read_to_string_with_limit(path: &Path, max_size: u64) -> Result<String> {
    let metadata = fs::metadata(path).map_err(|e| QuickfireError::storage(path, e))?;

    let size = metadata.len();
    if size > max_size {
        return Err(QuickfireError::storage(
            path,
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("file is too large ({} bytes, max {} bytes)", size, max_size),
            ),
        ));
    }

    fs::read_to_string(path).map_err(|e| QuickfireError::storage(path, e))
}

/// Replace a file's contents atomically (temp file + rename).
///
/// Creates the parent directory if needed.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| QuickfireError::storage(parent, e))?;
        }
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    {
        let mut file =
            fs::File::create(&temp_path).map_err(|e| QuickfireError::storage(&temp_path, e))?;
        file.write_all(contents)
            .map_err(|e| QuickfireError::storage(&temp_path, e))?;
        file.sync_all()
            .map_err(|e| QuickfireError::storage(&temp_path, e))?;
    }

    // Rename is atomic on POSIX
    fs::rename(&temp_path, path).map_err(|e| QuickfireError::storage(path, e))?;
    Ok(())
}
