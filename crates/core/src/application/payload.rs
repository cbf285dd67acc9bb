// Element body generation

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::constants::{BODY_FILLER, IRWIN_HALL_DRAWS};

/// Produces element bodies of a fixed or randomized size
///
/// Randomized sizes follow an Irwin-Hall approximation of a normal
/// distribution centred on the requested size, so most bodies are close
/// to it with rare outliers down to empty and up to twice the size.
pub struct PayloadGenerator<R: Rng = StdRng> {
    rng: R,
}

impl PayloadGenerator<StdRng> {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator (tests, reproducible stress runs)
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for PayloadGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> PayloadGenerator<R> {
    /// Size of the next body; may be below 1, meaning "empty"
    pub fn actual_size(&mut self, size: i64, randomize: bool) -> i64 {
        if !randomize {
            return size;
        }

        let half = f64::from(IRWIN_HALL_DRAWS) / 2.0;
        let sum: f64 = (0..IRWIN_HALL_DRAWS).map(|_| self.rng.gen::<f64>()).sum();
        let offset = (sum - half) / half * size as f64;

        size.saturating_add(offset.round() as i64)
    }

    /// Build a body of `size` filler bytes, randomized around `size` if asked
    ///
    /// Sizes below 1 give an empty body.
    pub fn generate(&mut self, size: i64, randomize: bool) -> Vec<u8> {
        match usize::try_from(self.actual_size(size, randomize)) {
            Ok(len) if len >= 1 => vec![BODY_FILLER; len],
            _ => Vec::new(),
        }
    }
}

/// Short human-readable body used when no size is configured
pub fn text_body(seq: u64) -> Vec<u8> {
    format!("Element {} ;-)\n", seq).into_bytes()
}
