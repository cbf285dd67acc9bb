// Directory queue, "simple" layout
// One file per element under time-bucketed intermediate directories;
// locking and publishing rely on hard links so concurrent processes
// never see half-written or doubly-claimed elements.

use rand::Rng;
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use dirq_test_core::domain::{ElementId, PurgeStats, QueueOptions};
use dirq_test_core::error::{AppError, Result};
use dirq_test_core::port::{DirectoryQueue, ElementIter, TimeProvider};

use crate::constants::{
    DEFAULT_GRANULARITY, DEFAULT_MAX_LOCK_SECS, DEFAULT_MAX_TEMP_SECS, DIR_MODE, FILE_MODE,
    LOCKED_SUFFIX, TEMPORARY_SUFFIX,
};
use crate::fs_util::{is_empty_dir, modified_micros, remove_if_exists, set_mode, touch};
use crate::naming::{dir_name, element_name, is_dir_name, is_element_name, strip_element_suffix};

/// Filesystem queue handle
pub struct SimpleQueue {
    root: PathBuf,
    granularity: u32,
    rndhex: u8,
    umask: Option<u32>,
    /// Seconds; 0 disables lock purging
    max_lock: u64,
    /// Seconds; 0 disables temporary purging
    max_temp: u64,
    time_provider: Arc<dyn TimeProvider>,
}

impl SimpleQueue {
    /// Open (and create if needed) a queue rooted at `options.path`
    ///
    /// # Arguments
    /// * `options` - Root path and tunables; `None` picks the layout default
    /// * `time_provider` - Clock for element names and purge ages
    pub fn open(options: &QueueOptions, time_provider: Arc<dyn TimeProvider>) -> Result<Self> {
        options.validate()?;

        let queue = Self {
            root: options.path.clone(),
            granularity: options.granularity.unwrap_or(DEFAULT_GRANULARITY),
            rndhex: options
                .rndhex
                .unwrap_or_else(|| rand::thread_rng().gen_range(0..16)),
            umask: options.umask,
            max_lock: options.max_lock.unwrap_or(DEFAULT_MAX_LOCK_SECS),
            max_temp: options.max_temp.unwrap_or(DEFAULT_MAX_TEMP_SECS),
            time_provider,
        };

        if !queue.root.is_dir() {
            fs::create_dir_all(&queue.root)
                .map_err(|e| AppError::storage("create", &queue.root, e))?;
            queue.apply_umask(&queue.root, DIR_MODE)?;
        }

        debug!(
            root = %queue.root.display(),
            granularity = queue.granularity,
            rndhex = queue.rndhex,
            max_lock = queue.max_lock,
            max_temp = queue.max_temp,
            "queue opened"
        );
        Ok(queue)
    }

    fn element_path(&self, id: &ElementId) -> PathBuf {
        self.root.join(id.as_str())
    }

    fn apply_umask(&self, path: &Path, mode: u32) -> Result<()> {
        match self.umask {
            Some(umask) => {
                set_mode(path, mode & !umask).map_err(|e| AppError::storage("chmod", path, e))
            }
            None => Ok(()),
        }
    }

    /// Sorted names of the intermediate directories currently present
    fn intermediate_dirs(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::storage("list", &self.root, e)),
        };

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| AppError::storage("list", &self.root, e))?;
            if let Some(name) = entry.file_name().to_str() {
                if is_dir_name(name) {
                    dirs.push(name.to_string());
                }
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    /// Create an intermediate directory unless it already exists
    fn ensure_dir(&self, dir: &Path) -> Result<()> {
        match fs::create_dir(dir) {
            Ok(()) => self.apply_umask(dir, DIR_MODE),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(AppError::storage("mkdir", dir, e)),
        }
    }

    /// Write `body` to a fresh temporary file inside `dir_path`
    fn write_temporary(&self, dir_path: &Path, body: &[u8]) -> Result<PathBuf> {
        let mut stamp = self.time_provider.now_micros();
        loop {
            let name = element_name(stamp, self.rndhex);
            let tmp = dir_path.join(format!("{}{}", name, TEMPORARY_SUFFIX));

            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&tmp)
            {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    stamp = self.next_stamp(stamp);
                    continue;
                }
                // intermediate directory purged meanwhile
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    self.ensure_dir(dir_path)?;
                    continue;
                }
                Err(e) => return Err(AppError::storage("create", &tmp, e)),
            };

            file.write_all(body)
                .map_err(|e| AppError::storage("write", &tmp, e))?;
            drop(file);
            self.apply_umask(&tmp, FILE_MODE)?;
            return Ok(tmp);
        }
    }

    /// Publish a temporary file under a fresh element name
    fn publish(&self, dir: &str, tmp: &Path) -> Result<ElementId> {
        let mut stamp = self.time_provider.now_micros();
        let name = loop {
            let name = element_name(stamp, self.rndhex);
            let path = self.root.join(dir).join(&name);

            match fs::hard_link(tmp, &path) {
                Ok(()) => break name,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    stamp = self.next_stamp(stamp);
                    continue;
                }
                Err(e) => return Err(AppError::storage("link", &path, e)),
            }
        };

        fs::remove_file(tmp).map_err(|e| AppError::storage("unlink", tmp, e))?;
        Ok(ElementId::new(format!("{}/{}", dir, name)))
    }

    /// Timestamp for the next name after `previous` collided
    ///
    /// Never reuses a timestamp, even when the clock has not moved.
    fn next_stamp(&self, previous: i64) -> i64 {
        self.time_provider
            .now_micros()
            .max(previous.saturating_add(1))
    }

    /// Purge one intermediate directory of stale temporaries and locks
    fn purge_dir(&self, dir: &str, now: i64, stats: &mut PurgeStats) -> Result<()> {
        let dir_path = self.root.join(dir);
        let entries = match fs::read_dir(&dir_path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(AppError::storage("list", &dir_path, e)),
        };

        let temp_cutoff = (self.max_temp > 0).then(|| now - secs_to_micros(self.max_temp));
        let lock_cutoff = (self.max_lock > 0).then(|| now - secs_to_micros(self.max_lock));

        for entry in entries {
            let entry = entry.map_err(|e| AppError::storage("list", &dir_path, e))?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };

            let (cutoff, kind) = if strip_element_suffix(name, TEMPORARY_SUFFIX).is_some() {
                (temp_cutoff, PurgeKind::Temporary)
            } else if strip_element_suffix(name, LOCKED_SUFFIX).is_some() {
                (lock_cutoff, PurgeKind::Lock)
            } else {
                continue;
            };
            let Some(cutoff) = cutoff else {
                continue;
            };

            let path = entry.path();
            let mtime = match modified_micros(&path) {
                Ok(mtime) => mtime,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(AppError::storage("stat", &path, e)),
            };
            if mtime >= cutoff {
                continue;
            }

            let removed =
                remove_if_exists(&path).map_err(|e| AppError::storage("unlink", &path, e))?;
            if !removed {
                continue;
            }
            match kind {
                PurgeKind::Temporary => {
                    warn!(path = %path.display(), "removing too old temporary element");
                    stats.temps_removed += 1;
                }
                PurgeKind::Lock => {
                    warn!(path = %path.display(), "removing too old locked element");
                    stats.locks_released += 1;
                }
            }
        }

        Ok(())
    }

    /// Remove empty intermediate directories, keeping the most recent one
    fn purge_empty_dirs(&self, dirs: &[String], stats: &mut PurgeStats) -> Result<()> {
        let Some((_latest, older)) = dirs.split_last() else {
            return Ok(());
        };

        for dir in older {
            let path = self.root.join(dir);
            match is_empty_dir(&path) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(AppError::storage("list", &path, e)),
            }
            match fs::remove_dir(&path) {
                Ok(()) => stats.dirs_removed += 1,
                // refilled or removed by another agent in between
                Err(_) if !path.exists() || !is_empty_dir(&path).unwrap_or(false) => {}
                Err(e) => return Err(AppError::storage("rmdir", &path, e)),
            }
        }

        Ok(())
    }
}

enum PurgeKind {
    Temporary,
    Lock,
}

fn secs_to_micros(secs: u64) -> i64 {
    i64::try_from(secs)
        .unwrap_or(i64::MAX)
        .saturating_mul(1_000_000)
}

fn lock_path(path: &Path) -> PathBuf {
    let mut lock = path.as_os_str().to_os_string();
    lock.push(LOCKED_SUFFIX);
    PathBuf::from(lock)
}

impl DirectoryQueue for SimpleQueue {
    fn add(&self, body: &[u8]) -> Result<ElementId> {
        let dir = dir_name(self.time_provider.now_secs(), self.granularity);
        let dir_path = self.root.join(&dir);
        self.ensure_dir(&dir_path)?;

        let tmp = self.write_temporary(&dir_path, body)?;
        self.publish(&dir, &tmp)
    }

    fn count(&self) -> Result<usize> {
        let mut count = 0;

        for dir in self.intermediate_dirs()? {
            let dir_path = self.root.join(&dir);
            let names = match list_names(&dir_path) {
                Ok(names) => names,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(AppError::storage("list", &dir_path, e)),
            };

            let locked: HashSet<&str> = names
                .iter()
                .filter_map(|n| strip_element_suffix(n, LOCKED_SUFFIX))
                .collect();
            count += names
                .iter()
                .filter(|n| is_element_name(n) && !locked.contains(n.as_str()))
                .count();
        }

        Ok(count)
    }

    fn elements(&self) -> Result<ElementIter<'_>> {
        Ok(Box::new(SimpleElements {
            root: &self.root,
            dirs: self.intermediate_dirs()?.into(),
            current_dir: String::new(),
            pending: VecDeque::new(),
        }))
    }

    fn lock(&self, id: &ElementId) -> Result<bool> {
        let path = self.element_path(id);
        let lock = lock_path(&path);

        match fs::hard_link(&path, &lock) {
            Ok(()) => {}
            // held by someone else, or already removed
            Err(e)
                if e.kind() == io::ErrorKind::AlreadyExists
                    || e.kind() == io::ErrorKind::NotFound =>
            {
                return Ok(false)
            }
            Err(e) => return Err(AppError::storage("lock", &lock, e)),
        }

        // lock age starts now (element and lock share the inode)
        match touch(&path, self.time_provider.now_micros()) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                remove_if_exists(&lock).map_err(|e| AppError::storage("unlock", &lock, e))?;
                Ok(false)
            }
            Err(e) => Err(AppError::storage("touch", &path, e)),
        }
    }

    fn unlock(&self, id: &ElementId) -> Result<()> {
        let lock = lock_path(&self.element_path(id));
        fs::remove_file(&lock).map_err(|e| AppError::storage("unlock", &lock, e))
    }

    fn get(&self, id: &ElementId) -> Result<Vec<u8>> {
        let path = self.element_path(id);
        fs::read(&path).map_err(|e| AppError::storage("get", &path, e))
    }

    fn remove(&self, id: &ElementId) -> Result<()> {
        let path = self.element_path(id);
        let lock = lock_path(&path);

        fs::remove_file(&path).map_err(|e| AppError::storage("remove", &path, e))?;
        fs::remove_file(&lock).map_err(|e| AppError::storage("remove", &lock, e))
    }

    fn purge(&self) -> Result<PurgeStats> {
        let mut stats = PurgeStats::default();

        let dirs = self.intermediate_dirs()?;
        self.purge_empty_dirs(&dirs, &mut stats)?;

        if self.max_temp > 0 || self.max_lock > 0 {
            let now = self.time_provider.now_micros();
            for dir in self.intermediate_dirs()? {
                self.purge_dir(&dir, now, &mut stats)?;
            }
        }

        debug!(
            root = %self.root.display(),
            locks_released = stats.locks_released,
            temps_removed = stats.temps_removed,
            dirs_removed = stats.dirs_removed,
            "queue purged"
        );
        Ok(stats)
    }
}

fn list_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        if let Some(name) = entry?.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Enumeration pass: directory list fixed at start, each directory
/// listed only when the pass reaches it
struct SimpleElements<'a> {
    root: &'a Path,
    dirs: VecDeque<String>,
    current_dir: String,
    pending: VecDeque<String>,
}

impl Iterator for SimpleElements<'_> {
    type Item = Result<ElementId>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pending.is_empty() {
            let dir = self.dirs.pop_front()?;
            let dir_path = self.root.join(&dir);

            let mut names = match list_names(&dir_path) {
                Ok(names) => names,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Some(Err(AppError::storage("list", &dir_path, e))),
            };
            names.retain(|n| is_element_name(n));
            names.sort();

            self.current_dir = dir;
            self.pending = names.into();
        }

        let name = self.pending.pop_front()?;
        Some(Ok(ElementId::new(format!("{}/{}", self.current_dir, name))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirq_test_core::port::time_provider::mocks::ManualTimeProvider;
    use dirq_test_core::port::time_provider::SystemTimeProvider;

    fn open(root: &Path) -> SimpleQueue {
        let mut options = QueueOptions::new(root.join("queue"));
        options.rndhex = Some(3);
        SimpleQueue::open(&options, Arc::new(SystemTimeProvider)).unwrap()
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names = list_names(dir).unwrap();
        names.sort();
        names
    }

    #[test]
    fn test_open_creates_root() {
        let tmp = tempfile::tempdir().unwrap();
        let queue = open(tmp.path());
        assert!(queue.root.is_dir());
        assert_eq!(queue.rndhex, 3);
    }

    #[test]
    fn test_add_publishes_element_without_temporary() {
        let tmp = tempfile::tempdir().unwrap();
        let queue = open(tmp.path());

        let id = queue.add(b"hello").unwrap();
        let (dir, name) = id.as_str().split_once('/').unwrap();
        assert!(is_dir_name(dir));
        assert!(is_element_name(name));
        assert!(name.ends_with('3'));
        assert_eq!(files_in(&queue.root.join(dir)), vec![name.to_string()]);
    }

    #[test]
    fn test_adds_with_frozen_clock_get_distinct_names() {
        let tmp = tempfile::tempdir().unwrap();
        let mut options = QueueOptions::new(tmp.path().join("queue"));
        options.rndhex = Some(1);
        let clock = Arc::new(ManualTimeProvider::at_secs(1_700_000_000));
        let queue = SimpleQueue::open(&options, clock).unwrap();

        let ids: Vec<ElementId> = (0..4).map(|_| queue.add(b"same instant").unwrap()).collect();

        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 4);
        assert_eq!(ids, unique, "names follow insertion order");
        assert_eq!(queue.count().unwrap(), 4);
    }

    #[test]
    fn test_lock_get_unlock_cycle() {
        let tmp = tempfile::tempdir().unwrap();
        let queue = open(tmp.path());
        let id = queue.add(b"payload").unwrap();

        assert!(queue.lock(&id).unwrap());
        assert!(!queue.lock(&id).unwrap(), "second lock must fail");
        assert_eq!(queue.count().unwrap(), 0);
        assert_eq!(queue.get(&id).unwrap(), b"payload".to_vec());

        queue.unlock(&id).unwrap();
        assert_eq!(queue.count().unwrap(), 1);
        assert!(queue.lock(&id).unwrap());
    }

    #[test]
    fn test_lock_on_removed_element_is_false() {
        let tmp = tempfile::tempdir().unwrap();
        let queue = open(tmp.path());
        let id = queue.add(b"x").unwrap();

        assert!(queue.lock(&id).unwrap());
        queue.remove(&id).unwrap();
        assert!(!queue.lock(&id).unwrap());
        assert_eq!(queue.count().unwrap(), 0);
    }

    #[test]
    fn test_enumeration_is_sorted_and_fresh_per_pass() {
        let tmp = tempfile::tempdir().unwrap();
        let queue = open(tmp.path());
        for i in 0..5 {
            queue.add(format!("{}", i).as_bytes()).unwrap();
        }

        let first: Vec<ElementId> = queue.elements().unwrap().map(|r| r.unwrap()).collect();
        let mut sorted = first.clone();
        sorted.sort();
        assert_eq!(first.len(), 5);
        assert_eq!(first, sorted);

        queue.add(b"late").unwrap();
        assert_eq!(queue.elements().unwrap().count(), 6);
    }

    #[test]
    fn test_enumeration_skips_vanished_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let queue = open(tmp.path());
        let id = queue.add(b"x").unwrap();

        let mut pass = queue.elements().unwrap();
        let (dir, _) = id.as_str().split_once('/').unwrap();
        fs::remove_dir_all(queue.root.join(dir)).unwrap();

        assert!(pass.next().is_none());
    }

    #[test]
    fn test_purge_keeps_latest_empty_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let queue = open(tmp.path());
        for dir in ["00000010", "00000020", "00000030"] {
            fs::create_dir(queue.root.join(dir)).unwrap();
        }

        let stats = queue.purge().unwrap();
        assert_eq!(stats.dirs_removed, 2);
        assert_eq!(files_in(&queue.root), vec!["00000030".to_string()]);
    }

    #[test]
    fn test_purge_removes_stale_temporaries_only_when_enabled() {
        let tmp = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualTimeProvider::at_secs(1_700_000_000));
        let mut options = QueueOptions::new(tmp.path().join("queue"));
        options.max_temp = Some(0);
        let disabled = SimpleQueue::open(&options, clock.clone()).unwrap();

        let dir = disabled.root.join("6553f100");
        fs::create_dir(&dir).unwrap();
        let stale = dir.join("6553f10000000a.tmp");
        fs::write(&stale, b"half").unwrap();
        touch(&stale, 1_600_000_000 * 1_000_000).unwrap();

        assert_eq!(disabled.purge().unwrap().temps_removed, 0);
        assert!(stale.exists());

        options.max_temp = None;
        let enabled = SimpleQueue::open(&options, clock).unwrap();
        assert_eq!(enabled.purge().unwrap().temps_removed, 1);
        assert!(!stale.exists());
    }

    #[test]
    fn test_umask_applies_to_created_files() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let tmp = tempfile::tempdir().unwrap();
            let mut options = QueueOptions::new(tmp.path().join("queue"));
            options.umask = Some(0o077);
            let queue = SimpleQueue::open(&options, Arc::new(SystemTimeProvider)).unwrap();

            let id = queue.add(b"secret").unwrap();
            let mode = fs::metadata(queue.element_path(&id))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
