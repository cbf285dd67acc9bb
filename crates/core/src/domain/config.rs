// Harness Configuration

use serde::{Deserialize, Serialize};

use super::queue::QueueOptions;

/// Configuration bundle for one harness run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Element target (`None` = unbounded for add, one pass otherwise)
    pub count: Option<u64>,
    /// Body size (`None` = short text body)
    pub size: Option<usize>,
    /// Randomize body sizes around `size`
    pub random: bool,
    /// Request element headers (not supported by the simple layout)
    pub header: bool,
    pub queue: QueueOptions,
}

impl HarnessConfig {
    pub fn new(queue: QueueOptions) -> Self {
        Self {
            count: None,
            size: None,
            random: false,
            header: false,
            queue,
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_size(mut self, size: usize, random: bool) -> Self {
        self.size = Some(size);
        self.random = random;
        self
    }
}
