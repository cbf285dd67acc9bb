// Directory Queue Port (Interface)

use crate::domain::{ElementId, PurgeStats, QueueOptions};
use crate::error::Result;

/// One enumeration pass over the visible elements of a queue
///
/// Lazy, finite and single-pass. Elements removed by other agents while
/// the pass is running are skipped silently. Obtain a new pass from
/// [`DirectoryQueue::elements`] each time; passes are never rewound.
pub type ElementIter<'a> = Box<dyn Iterator<Item = Result<ElementId>> + 'a>;

/// Queue handle bound to one root directory
///
/// All operations block until the storage layer has completed them.
/// Implementations must keep `add`, `lock`, `remove` and `purge` atomic
/// per call so that independent processes can share the same root.
pub trait DirectoryQueue: Send + Sync {
    /// Durably enqueue a new element, visible once this returns
    fn add(&self, body: &[u8]) -> Result<ElementId>;

    /// Number of visible elements (neither locked nor temporary)
    fn count(&self) -> Result<usize>;

    /// Start a fresh enumeration pass
    fn elements(&self) -> Result<ElementIter<'_>>;

    /// Try to take the exclusive lock on an element
    ///
    /// # Returns
    /// `false` when another agent holds the lock or the element is gone.
    /// This is a normal outcome, not an error.
    fn lock(&self, id: &ElementId) -> Result<bool>;

    /// Release a lock held by this handle without consuming the element
    fn unlock(&self, id: &ElementId) -> Result<()>;

    /// Read the body of an element locked by this handle
    fn get(&self, id: &ElementId) -> Result<Vec<u8>>;

    /// Delete an element locked by this handle
    fn remove(&self, id: &ElementId) -> Result<()>;

    /// Reclaim stale locks and orphaned temporaries
    ///
    /// Thresholds come from the options the handle was opened with:
    /// an explicit 0 disables that kind of purging.
    fn purge(&self) -> Result<PurgeStats>;
}

/// Opens queue handles (one per scenario invocation)
pub trait QueueFactory: Send + Sync {
    fn open(&self, options: &QueueOptions) -> Result<Box<dyn DirectoryQueue>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use crate::port::TimeProvider;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::{Arc, Mutex, MutexGuard};

    const DEFAULT_MAX_LOCK_SECS: u64 = 600;

    /// Queue operations that can be made to fail
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum FaultOp {
        Add,
        /// Fails mid-pass: the iterator yields an error after `n` ids
        Elements,
        Get,
        Remove,
        Purge,
    }

    impl FaultOp {
        fn as_str(&self) -> &'static str {
            match self {
                FaultOp::Add => "add",
                FaultOp::Elements => "list",
                FaultOp::Get => "get",
                FaultOp::Remove => "remove",
                FaultOp::Purge => "purge",
            }
        }
    }

    #[derive(Debug, Clone)]
    struct MemoryElement {
        body: Vec<u8>,
        /// Lock timestamp (ms) when locked
        locked_at: Option<i64>,
    }

    #[derive(Debug, Default)]
    struct MemoryState {
        elements: BTreeMap<ElementId, MemoryElement>,
        next_seq: u64,
        opened: Vec<QueueOptions>,
        /// Successful calls left before an operation starts failing
        faults: HashMap<FaultOp, usize>,
    }

    impl MemoryState {
        /// Consume one successful call of `op`, or fail once none are left
        fn check(&mut self, op: FaultOp) -> Result<()> {
            match self.faults.get_mut(&op) {
                Some(0) => Err(injected(op)),
                Some(left) => {
                    *left -= 1;
                    Ok(())
                }
                None => Ok(()),
            }
        }
    }

    fn injected(op: FaultOp) -> AppError {
        AppError::storage(
            op.as_str(),
            "memory",
            std::io::Error::other("injected failure"),
        )
    }

    /// In-memory queue shared by every handle the factory opens
    #[derive(Clone)]
    pub struct MemoryQueueFactory {
        state: Arc<Mutex<MemoryState>>,
        time_provider: Arc<dyn TimeProvider>,
    }

    impl MemoryQueueFactory {
        pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
            Self {
                state: Arc::new(Mutex::new(MemoryState::default())),
                time_provider,
            }
        }

        fn state(&self) -> MutexGuard<'_, MemoryState> {
            lock_state(&self.state)
        }

        /// Make every `op` call after the first `n` fail with a storage error
        pub fn fail_after(&self, op: FaultOp, n: usize) {
            self.state().faults.insert(op, n);
        }

        /// Simulate another agent holding the lock on the first `n` elements
        pub fn lock_externally(&self, n: usize) {
            let now = self.time_provider.now_millis();
            let mut state = self.state();
            for element in state.elements.values_mut().take(n) {
                element.locked_at = Some(now);
            }
        }

        /// Elements stored, locked or not
        pub fn stored(&self) -> usize {
            self.state().elements.len()
        }

        pub fn locked(&self) -> usize {
            self.state()
                .elements
                .values()
                .filter(|e| e.locked_at.is_some())
                .count()
        }

        /// Options of every handle opened so far
        pub fn opened(&self) -> Vec<QueueOptions> {
            self.state().opened.clone()
        }
    }

    impl QueueFactory for MemoryQueueFactory {
        fn open(&self, options: &QueueOptions) -> Result<Box<dyn DirectoryQueue>> {
            self.state().opened.push(options.clone());
            Ok(Box::new(MemoryQueue {
                state: self.state.clone(),
                time_provider: self.time_provider.clone(),
                max_lock: options.max_lock.unwrap_or(DEFAULT_MAX_LOCK_SECS),
            }))
        }
    }

    /// Handle over the shared in-memory state
    pub struct MemoryQueue {
        state: Arc<Mutex<MemoryState>>,
        time_provider: Arc<dyn TimeProvider>,
        max_lock: u64,
    }

    fn lock_state(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
        state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn missing(op: &'static str, id: &ElementId) -> AppError {
        AppError::storage(
            op,
            id.as_str(),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        )
    }

    impl MemoryQueue {
        fn held<'a>(
            state: &'a mut MemoryState,
            op: &'static str,
            id: &ElementId,
        ) -> Result<&'a mut MemoryElement> {
            match state.elements.get_mut(id) {
                Some(element) if element.locked_at.is_some() => Ok(element),
                _ => Err(missing(op, id)),
            }
        }
    }

    impl DirectoryQueue for MemoryQueue {
        fn add(&self, body: &[u8]) -> Result<ElementId> {
            let mut state = lock_state(&self.state);
            state.check(FaultOp::Add)?;
            state.next_seq += 1;
            let id = ElementId::new(format!("{:014x}", state.next_seq));
            state.elements.insert(
                id.clone(),
                MemoryElement {
                    body: body.to_vec(),
                    locked_at: None,
                },
            );
            Ok(id)
        }

        fn count(&self) -> Result<usize> {
            Ok(lock_state(&self.state)
                .elements
                .values()
                .filter(|e| e.locked_at.is_none())
                .count())
        }

        fn elements(&self) -> Result<ElementIter<'_>> {
            let state = lock_state(&self.state);
            let snapshot: Vec<ElementId> = state.elements.keys().cloned().collect();
            match state.faults.get(&FaultOp::Elements).copied() {
                Some(n) => Ok(Box::new(
                    snapshot
                        .into_iter()
                        .take(n)
                        .map(Ok)
                        .chain(std::iter::once(Err(injected(FaultOp::Elements)))),
                )),
                None => Ok(Box::new(snapshot.into_iter().map(Ok))),
            }
        }

        fn lock(&self, id: &ElementId) -> Result<bool> {
            let now = self.time_provider.now_millis();
            let mut state = lock_state(&self.state);
            match state.elements.get_mut(id) {
                Some(element) if element.locked_at.is_none() => {
                    element.locked_at = Some(now);
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        fn unlock(&self, id: &ElementId) -> Result<()> {
            let mut state = lock_state(&self.state);
            Self::held(&mut state, "unlock", id)?.locked_at = None;
            Ok(())
        }

        fn get(&self, id: &ElementId) -> Result<Vec<u8>> {
            let mut state = lock_state(&self.state);
            Self::held(&mut state, "get", id)?;
            state.check(FaultOp::Get)?;
            Ok(Self::held(&mut state, "get", id)?.body.clone())
        }

        fn remove(&self, id: &ElementId) -> Result<()> {
            let mut state = lock_state(&self.state);
            Self::held(&mut state, "remove", id)?;
            state.check(FaultOp::Remove)?;
            state.elements.remove(id);
            Ok(())
        }

        fn purge(&self) -> Result<PurgeStats> {
            let mut stats = PurgeStats::default();
            let mut state = lock_state(&self.state);
            state.check(FaultOp::Purge)?;
            if self.max_lock == 0 {
                return Ok(stats);
            }

            let cutoff = self.time_provider.now_millis() - (self.max_lock as i64) * 1000;
            for element in state.elements.values_mut() {
                if matches!(element.locked_at, Some(at) if at < cutoff) {
                    element.locked_at = None;
                    stats.locks_released += 1;
                }
            }
            Ok(stats)
        }
    }
}
