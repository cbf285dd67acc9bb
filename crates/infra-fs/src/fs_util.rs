// Small filesystem helpers shared by the queue and the probe

use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};

/// Set both access and modification time of `path` (epoch microseconds)
#[cfg(unix)]
pub fn touch(path: &Path, micros: i64) -> io::Result<()> {
    use nix::sys::time::{TimeVal, TimeValLike};

    let stamp = TimeVal::microseconds(micros);
    nix::sys::stat::utimes(path, &stamp, &stamp).map_err(io::Error::from)
}

#[cfg(not(unix))]
pub fn touch(path: &Path, micros: i64) -> io::Result<()> {
    let stamp = UNIX_EPOCH + Duration::from_micros(u64::try_from(micros).unwrap_or(0));
    let file = fs::OpenOptions::new().write(true).open(path)?;
    file.set_times(fs::FileTimes::new().set_accessed(stamp).set_modified(stamp))
}

/// Modification time of `path` in epoch microseconds
pub fn modified_micros(path: &Path) -> io::Result<i64> {
    let modified = fs::symlink_metadata(path)?.modified()?;
    let since_epoch = modified
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);
    Ok(i64::try_from(since_epoch.as_micros()).unwrap_or(i64::MAX))
}

/// Apply explicit permission bits (used when the queue carries its own umask)
#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
pub fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

/// Remove a file, treating "already gone" as success
///
/// # Returns
/// `true` if this call removed the file
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Whether a directory has no entries
pub fn is_empty_dir(path: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}
