// Scenario constants (no magic values)
use std::time::Duration;

/// Uniform draws summed per Irwin-Hall sample (12 gives variance 1)
pub const IRWIN_HALL_DRAWS: u32 = 12;

/// Filler byte for generated bodies
pub const BODY_FILLER: u8 = b'A';

/// Pause after a remove pass that removed nothing (target not yet met)
pub const EMPTY_PASS_BACKOFF: Duration = Duration::from_millis(10);

/// Top-level entries expected under the root after the composite pipeline
/// (purge keeps the most recent intermediate directory)
pub const EXPECTED_RESIDUAL_ENTRIES: usize = 1;
