// Scenario Runner - named operation sequences against a queue

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use super::constants::EMPTY_PASS_BACKOFF;
use super::payload::{text_body, PayloadGenerator};
use crate::domain::{HarnessConfig, ScenarioKind, ScenarioReport};
use crate::error::{AppError, Result};
use crate::port::{DirectoryQueue, QueueFactory};

/// Runs the single-queue scenarios
///
/// Every scenario opens its own queue handle, runs its operate loop,
/// and drops the handle on return. Errors abort the scenario at once.
pub struct ScenarioRunner {
    factory: Arc<dyn QueueFactory>,
    config: HarnessConfig,
    generator: PayloadGenerator,
}

impl ScenarioRunner {
    /// Create a new scenario runner
    ///
    /// # Arguments
    /// * `factory` - Opens queue handles (one per scenario)
    /// * `config` - Count/size targets and queue options
    pub fn new(factory: Arc<dyn QueueFactory>, config: HarnessConfig) -> Self {
        Self {
            factory,
            config,
            generator: PayloadGenerator::new(),
        }
    }

    pub fn with_generator(mut self, generator: PayloadGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run one scenario with the configured targets
    ///
    /// The composite scenario needs a storage probe and is driven by
    /// `CompositeValidator` instead.
    pub fn run(&mut self, kind: ScenarioKind) -> Result<ScenarioReport> {
        match kind {
            ScenarioKind::Add => self.add(self.config.count),
            ScenarioKind::Count => self.count(),
            ScenarioKind::Get => self.get(),
            ScenarioKind::Iterate => self.iterate(),
            ScenarioKind::Purge => self.purge(),
            ScenarioKind::Remove => self.remove(self.config.count),
            ScenarioKind::Simple => Err(AppError::Config(
                "the simple scenario is run by the composite validator".to_string(),
            )),
        }
    }

    fn open(&self) -> Result<Box<dyn DirectoryQueue>> {
        self.config.queue.validate()?;
        self.factory.open(&self.config.queue)
    }

    /// Add `target` elements, or keep adding until the process is killed
    /// or the queue fails
    pub fn add(&mut self, target: Option<u64>) -> Result<ScenarioReport> {
        match target {
            Some(n) => debug!("adding {} elements to the queue...", n),
            None => debug!("adding elements to the queue forever..."),
        }
        if self.config.header {
            warn!(
                queue_type = %self.config.queue.queue_type,
                "element headers are not supported by this queue type, adding bodies only"
            );
        }

        let queue = self.open()?;
        let started = Instant::now();
        let mut done: u64 = 0;

        while target.map_or(true, |n| done < n) {
            done += 1;
            let body = match self.config.size {
                Some(size) => self
                    .generator
                    .generate(i64::try_from(size).unwrap_or(i64::MAX), self.config.random),
                None => text_body(done),
            };
            queue.add(&body)?;
        }

        debug!("added {} elements", done);
        Ok(ScenarioReport::new(ScenarioKind::Add, done, started.elapsed()))
    }

    /// Count visible elements
    pub fn count(&mut self) -> Result<ScenarioReport> {
        let queue = self.open()?;
        let started = Instant::now();
        let count = queue.count()?;

        debug!("queue has {} elements", count);
        Ok(ScenarioReport::new(
            ScenarioKind::Count,
            count as u64,
            started.elapsed(),
        ))
    }

    /// Lock, read and unlock every element of one pass
    pub fn get(&mut self) -> Result<ScenarioReport> {
        debug!("getting all elements in the queue (one pass)...");
        let queue = self.open()?;
        let started = Instant::now();
        let mut done: u64 = 0;

        for id in queue.elements()? {
            let id = id?;
            if !queue.lock(&id)? {
                continue;
            }
            queue.get(&id)?;
            queue.unlock(&id)?;
            done += 1;
        }

        debug!("got {} elements", done);
        Ok(ScenarioReport::new(ScenarioKind::Get, done, started.elapsed()))
    }

    /// Lock and unlock every element of one pass
    pub fn iterate(&mut self) -> Result<ScenarioReport> {
        debug!("iterating all elements in the queue (one pass)...");
        let queue = self.open()?;
        let started = Instant::now();
        let mut done: u64 = 0;

        for id in queue.elements()? {
            let id = id?;
            if !queue.lock(&id)? {
                continue;
            }
            queue.unlock(&id)?;
            done += 1;
        }

        debug!("iterated {} elements", done);
        Ok(ScenarioReport::new(
            ScenarioKind::Iterate,
            done,
            started.elapsed(),
        ))
    }

    /// Purge with the configured lock/temp thresholds
    pub fn purge(&mut self) -> Result<ScenarioReport> {
        debug!(
            max_lock = ?self.config.queue.max_lock,
            max_temp = ?self.config.queue.max_temp,
            "purging the queue..."
        );
        let queue = self.open()?;
        let started = Instant::now();
        let stats = queue.purge()?;

        debug!(
            locks_released = stats.locks_released,
            temps_removed = stats.temps_removed,
            dirs_removed = stats.dirs_removed,
            "purge finished"
        );
        let mut report = ScenarioReport::new(
            ScenarioKind::Purge,
            stats.locks_released + stats.temps_removed,
            started.elapsed(),
        );
        report.purge = Some(stats);
        Ok(report)
    }

    /// Remove elements: one pass, or as many passes as needed to reach `target`
    pub fn remove(&mut self, target: Option<u64>) -> Result<ScenarioReport> {
        match target {
            Some(n) => debug!("removing {} elements from the queue...", n),
            None => debug!("removing all elements from the queue (one pass)..."),
        }
        let queue = self.open()?;
        let started = Instant::now();

        let done = match target {
            Some(n) => remove_until(queue.as_ref(), n)?,
            None => remove_pass(queue.as_ref(), None)?,
        };

        debug!("removed {} elements", done);
        Ok(ScenarioReport::new(
            ScenarioKind::Remove,
            done,
            started.elapsed(),
        ))
    }
}

/// Keep running remove passes until `target` elements are gone
fn remove_until(queue: &dyn DirectoryQueue, target: u64) -> Result<u64> {
    let mut done: u64 = 0;
    let mut passes: u64 = 0;

    while done < target {
        passes += 1;
        let removed = remove_pass(queue, Some(target - done))?;
        if removed == 0 {
            std::thread::sleep(EMPTY_PASS_BACKOFF);
        }
        done += removed;
    }

    debug!(passes, "remove passes");
    Ok(done)
}

/// One enumeration pass removing every element it manages to lock,
/// stopping early once `limit` elements are gone
fn remove_pass(queue: &dyn DirectoryQueue, limit: Option<u64>) -> Result<u64> {
    let mut removed: u64 = 0;

    for id in queue.elements()? {
        let id = id?;
        if !queue.lock(&id)? {
            continue;
        }
        queue.remove(&id)?;
        removed += 1;
        if limit == Some(removed) {
            break;
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QueueOptions;
    use crate::port::queue::mocks::{FaultOp, MemoryQueueFactory};
    use crate::port::time_provider::mocks::ManualTimeProvider;

    fn setup() -> (Arc<MemoryQueueFactory>, Arc<ManualTimeProvider>) {
        let clock = Arc::new(ManualTimeProvider::at_secs(1_700_000_000));
        let factory = Arc::new(MemoryQueueFactory::new(clock.clone()));
        (factory, clock)
    }

    fn runner(factory: &Arc<MemoryQueueFactory>, config: HarnessConfig) -> ScenarioRunner {
        ScenarioRunner::new(factory.clone(), config).with_generator(PayloadGenerator::seeded(5))
    }

    fn config() -> HarnessConfig {
        HarnessConfig::new(QueueOptions::new("/tmp/dirq-memory"))
    }

    #[test]
    fn test_add_then_count() {
        let (factory, _) = setup();
        let mut runner = runner(&factory, config().with_count(25));

        assert_eq!(runner.run(ScenarioKind::Add).unwrap().done, 25);
        assert_eq!(runner.run(ScenarioKind::Count).unwrap().done, 25);
    }

    #[test]
    fn test_add_uses_text_body_without_size() {
        let (factory, _) = setup();
        let mut runner = runner(&factory, config().with_count(1));
        runner.run(ScenarioKind::Add).unwrap();

        let queue = factory.open(&runner.config().queue).unwrap();
        let id = queue.elements().unwrap().next().unwrap().unwrap();
        assert!(queue.lock(&id).unwrap());
        assert_eq!(queue.get(&id).unwrap(), b"Element 1 ;-)\n".to_vec());
    }

    #[test]
    fn test_add_with_size_generates_filler() {
        let (factory, _) = setup();
        let mut runner = runner(&factory, config().with_count(3).with_size(64, false));
        runner.run(ScenarioKind::Add).unwrap();

        let queue = factory.open(&runner.config().queue).unwrap();
        for id in queue.elements().unwrap() {
            let id = id.unwrap();
            assert!(queue.lock(&id).unwrap());
            assert_eq!(queue.get(&id).unwrap(), vec![b'A'; 64]);
        }
    }

    #[test]
    fn test_unbounded_add_runs_until_storage_error() {
        let (factory, _) = setup();
        factory.fail_after(FaultOp::Add, 7);
        let mut runner = runner(&factory, config());

        let err = runner.run(ScenarioKind::Add).unwrap_err();
        assert!(err.is_storage());
        assert_eq!(factory.stored(), 7);
    }

    #[test]
    fn test_add_error_is_not_retried() {
        let (factory, _) = setup();
        factory.fail_after(FaultOp::Add, 2);
        let mut runner = runner(&factory, config().with_count(5));

        let err = runner.run(ScenarioKind::Add).unwrap_err();
        assert!(err.is_storage());
        assert_eq!(factory.stored(), 2);
    }

    #[test]
    fn test_get_error_stops_the_pass() {
        let (factory, _) = setup();
        let mut runner = runner(&factory, config().with_count(5));
        runner.run(ScenarioKind::Add).unwrap();
        factory.fail_after(FaultOp::Get, 2);

        let err = runner.run(ScenarioKind::Get).unwrap_err();
        assert!(err.is_storage());
        // the failing element keeps its lock, later elements are never touched
        assert_eq!(factory.locked(), 1);
        assert_eq!(factory.stored(), 5);
    }

    #[test]
    fn test_enumeration_error_propagates() {
        let (factory, _) = setup();
        let mut runner = runner(&factory, config().with_count(5));
        runner.run(ScenarioKind::Add).unwrap();
        factory.fail_after(FaultOp::Elements, 3);

        let err = runner.run(ScenarioKind::Iterate).unwrap_err();
        assert!(err.is_storage());
        assert!(err.to_string().contains("list"));
        assert_eq!(factory.locked(), 0);

        let err = runner.remove(None).unwrap_err();
        assert!(err.is_storage());
        assert_eq!(factory.stored(), 2);
    }

    #[test]
    fn test_remove_error_is_not_retried() {
        let (factory, _) = setup();
        let mut runner = runner(&factory, config().with_count(5));
        runner.run(ScenarioKind::Add).unwrap();
        factory.fail_after(FaultOp::Remove, 2);

        // a targeted remove must fail at once instead of starting a new pass
        let err = runner.remove(Some(5)).unwrap_err();
        assert!(err.is_storage());
        assert!(err.to_string().contains("remove"));
        assert_eq!(factory.stored(), 3);
        assert_eq!(factory.locked(), 1);
    }

    #[test]
    fn test_purge_error_propagates() {
        let (factory, _) = setup();
        factory.fail_after(FaultOp::Purge, 0);
        let mut runner = runner(&factory, config());

        let err = runner.run(ScenarioKind::Purge).unwrap_err();
        assert!(err.is_storage());
        assert!(err.to_string().contains("purge"));
    }

    #[test]
    fn test_get_skips_locked_elements() {
        let (factory, _) = setup();
        let mut runner = runner(&factory, config().with_count(5));
        runner.run(ScenarioKind::Add).unwrap();
        factory.lock_externally(2);

        assert_eq!(runner.run(ScenarioKind::Get).unwrap().done, 3);
        // get unlocks what it locked, foreign locks stay
        assert_eq!(factory.locked(), 2);
        assert_eq!(factory.stored(), 5);
    }

    #[test]
    fn test_iterate_is_idempotent() {
        let (factory, _) = setup();
        let mut runner = runner(&factory, config().with_count(10));
        runner.run(ScenarioKind::Add).unwrap();

        let first = runner.run(ScenarioKind::Iterate).unwrap().done;
        let second = runner.run(ScenarioKind::Iterate).unwrap().done;
        assert_eq!(first, 10);
        assert_eq!(first, second);
        assert_eq!(runner.run(ScenarioKind::Count).unwrap().done, 10);
    }

    #[test]
    fn test_remove_one_pass_empties_queue() {
        let (factory, _) = setup();
        let mut runner = runner(&factory, config().with_count(8));
        runner.run(ScenarioKind::Add).unwrap();

        assert_eq!(runner.remove(None).unwrap().done, 8);
        assert_eq!(factory.stored(), 0);
    }

    #[test]
    fn test_remove_with_target_leaves_rest() {
        let (factory, _) = setup();
        let mut runner = runner(&factory, config().with_count(10));
        runner.run(ScenarioKind::Add).unwrap();

        assert_eq!(runner.remove(Some(4)).unwrap().done, 4);
        assert_eq!(runner.run(ScenarioKind::Count).unwrap().done, 6);
    }

    #[test]
    fn test_remove_with_target_spans_passes() {
        let (factory, clock) = setup();
        let mut runner = runner(&factory, config().with_count(6));
        runner.run(ScenarioKind::Add).unwrap();

        // Foreign locks block the first pass; they go stale and get purged
        // by a concurrent agent while the remover keeps looping.
        factory.lock_externally(6);
        clock.advance_secs(3600);
        let purger = {
            let factory = factory.clone();
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(30));
                let queue = factory.open(&QueueOptions::new("/tmp/dirq-memory")).unwrap();
                queue.purge().unwrap()
            })
        };

        assert_eq!(runner.remove(Some(6)).unwrap().done, 6);
        assert_eq!(purger.join().unwrap().locks_released, 6);
        assert_eq!(factory.stored(), 0);
    }

    #[test]
    fn test_purge_forwards_thresholds() {
        let (factory, clock) = setup();
        let mut cfg = config().with_count(3);
        cfg.queue.max_lock = Some(0);
        let mut runner = runner(&factory, cfg);
        runner.run(ScenarioKind::Add).unwrap();
        factory.lock_externally(3);
        clock.advance_secs(100_000);

        let report = runner.run(ScenarioKind::Purge).unwrap();
        assert_eq!(report.purge.unwrap().locks_released, 0);
        assert_eq!(factory.locked(), 3);
        assert!(factory.opened().iter().all(|o| o.max_lock == Some(0)));
    }

    #[test]
    fn test_purge_releases_stale_locks() {
        let (factory, clock) = setup();
        let mut cfg = config().with_count(3);
        cfg.queue.max_lock = Some(60);
        let mut runner = runner(&factory, cfg);
        runner.run(ScenarioKind::Add).unwrap();
        factory.lock_externally(3);
        clock.advance_secs(61);

        let report = runner.run(ScenarioKind::Purge).unwrap();
        assert_eq!(report.done, 3);
        assert_eq!(runner.run(ScenarioKind::Iterate).unwrap().done, 3);
    }

    #[test]
    fn test_each_scenario_opens_fresh_handle() {
        let (factory, _) = setup();
        let mut runner = runner(&factory, config().with_count(1));
        runner.run(ScenarioKind::Add).unwrap();
        runner.run(ScenarioKind::Count).unwrap();
        runner.run(ScenarioKind::Get).unwrap();

        assert_eq!(factory.opened().len(), 3);
    }

    #[test]
    fn test_invalid_options_fail_before_open() {
        let (factory, _) = setup();
        let mut cfg = config();
        cfg.queue.rndhex = Some(99);
        let mut runner = runner(&factory, cfg);

        assert!(matches!(
            runner.run(ScenarioKind::Count).unwrap_err(),
            AppError::Domain(_)
        ));
        assert!(factory.opened().is_empty());
    }

    #[test]
    fn test_run_rejects_simple() {
        let (factory, _) = setup();
        let mut runner = runner(&factory, config());
        assert!(matches!(
            runner.run(ScenarioKind::Simple).unwrap_err(),
            AppError::Config(_)
        ));
    }
}
