// Dirq Infrastructure - Filesystem Adapter
// Implements: DirectoryQueue (simple layout), QueueFactory, StorageProbe

pub mod constants;
mod factory;
mod fs_util;
mod naming;
mod simple_queue;
mod storage_probe_impl;

pub use factory::SimpleQueueFactory;
pub use simple_queue::SimpleQueue;
pub use storage_probe_impl::FsStorageProbe;
