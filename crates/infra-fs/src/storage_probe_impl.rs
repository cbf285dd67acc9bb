// StorageProbe backed by the local filesystem

use std::fs;
use std::io;
use std::path::Path;

use dirq_test_core::error::{AppError, Result};
use dirq_test_core::port::StorageProbe;

pub struct FsStorageProbe;

impl StorageProbe for FsStorageProbe {
    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn count_entries(&self, path: &Path) -> Result<usize> {
        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(AppError::storage("list", path, e)),
        };

        let mut count = 0;
        for entry in entries {
            entry.map_err(|e| AppError::storage("list", path, e))?;
            count += 1;
        }
        Ok(count)
    }
}
