// Composite "simple" scenario: end-to-end pipeline + residual structure check

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use super::constants::EXPECTED_RESIDUAL_ENTRIES;
use super::scenario::ScenarioRunner;
use crate::domain::CompositeReport;
use crate::error::{AppError, Result};
use crate::port::StorageProbe;

/// Runs add → count → purge → get → remove → purge on a fresh root and
/// checks that exactly one intermediate directory survives
///
/// The root is never deleted here; cleaning it up is left to the caller.
pub struct CompositeValidator {
    probe: Arc<dyn StorageProbe>,
}

impl CompositeValidator {
    pub fn new(probe: Arc<dyn StorageProbe>) -> Self {
        Self { probe }
    }

    /// Check pre-conditions, run the pipeline and verify the residual layout
    ///
    /// # Errors
    /// * `AppError::Config` - root already exists or no count target
    /// * `AppError::Structure` - residual entry count differs from one
    /// * any storage error raised by a stage, unchanged
    pub fn validate(&self, runner: &mut ScenarioRunner) -> Result<CompositeReport> {
        let root = runner.config().queue.path.clone();

        if self.probe.exists(&root) {
            return Err(AppError::Config(format!(
                "directory exists: {}",
                root.display()
            )));
        }
        let count = runner
            .config()
            .count
            .ok_or_else(|| AppError::Config("missing option: --count".to_string()))?;

        info!(root = %root.display(), count, "Running simple pipeline");
        let started = Instant::now();

        let stages = vec![
            runner.add(Some(count))?,
            runner.count()?,
            runner.purge()?,
            runner.get()?,
            runner.remove(None)?,
            runner.purge()?,
        ];

        let residual_entries = self.probe.count_entries(&root)?;
        if residual_entries != EXPECTED_RESIDUAL_ENTRIES {
            error!(
                root = %root.display(),
                residual_entries,
                "Residual structure check failed"
            );
            return Err(AppError::Structure(format!(
                "unexpected subdirs number: {}",
                residual_entries
            )));
        }

        debug!(residual_entries, "residual structure check passed");
        Ok(CompositeReport {
            stages,
            residual_entries,
            elapsed: started.elapsed(),
        })
    }
}
