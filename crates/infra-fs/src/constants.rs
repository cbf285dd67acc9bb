// Simple queue layout constants

/// Default seconds covered by one intermediate directory
pub const DEFAULT_GRANULARITY: u32 = 60;

/// Default maximum lock age before purge releases it (seconds)
pub const DEFAULT_MAX_LOCK_SECS: u64 = 600;

/// Default maximum temporary element age before purge deletes it (seconds)
pub const DEFAULT_MAX_TEMP_SECS: u64 = 300;

/// Hex digits in an intermediate directory name
pub const DIR_NAME_LEN: usize = 8;

/// Hex digits in an element name: seconds (8) + microseconds (5) + rndhex (1)
pub const ELEMENT_NAME_LEN: usize = 14;

/// Suffix of an element being written
pub const TEMPORARY_SUFFIX: &str = ".tmp";

/// Suffix of the hard link marking an element as locked
pub const LOCKED_SUFFIX: &str = ".lck";

/// Permission bits before the umask is applied
pub const FILE_MODE: u32 = 0o666;
pub const DIR_MODE: u32 = 0o777;
