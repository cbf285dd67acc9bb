// QueueFactory for the simple layout

use std::sync::Arc;

use dirq_test_core::domain::{QueueOptions, QueueType};
use dirq_test_core::error::Result;
use dirq_test_core::port::{DirectoryQueue, QueueFactory, TimeProvider};

use crate::simple_queue::SimpleQueue;

/// Opens filesystem-backed queue handles
pub struct SimpleQueueFactory {
    time_provider: Arc<dyn TimeProvider>,
}

impl SimpleQueueFactory {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { time_provider }
    }
}

impl QueueFactory for SimpleQueueFactory {
    fn open(&self, options: &QueueOptions) -> Result<Box<dyn DirectoryQueue>> {
        match options.queue_type {
            QueueType::Simple => Ok(Box::new(SimpleQueue::open(
                options,
                self.time_provider.clone(),
            )?)),
        }
    }
}
