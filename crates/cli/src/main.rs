//! dirq-test - stress and interoperability harness for directory queues
//! Composition root: wires the filesystem adapter into the scenario engine

mod args;
mod report;
mod telemetry;

use anyhow::Result;
use clap::Parser;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn};

use dirq_infra_fs::{FsStorageProbe, SimpleQueueFactory};
use dirq_test_core::application::{CompositeValidator, ScenarioRunner};
use dirq_test_core::domain::{CompositeReport, HarnessIdentity, ScenarioKind};
use dirq_test_core::port::time_provider::SystemTimeProvider;
use dirq_test_core::port::StorageProbe;

use args::Cli;
use report::Outcome;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list {
        let names: Vec<&str> = ScenarioKind::ALL.iter().map(|k| k.as_str()).collect();
        println!("Available tests: {}", names.join(" "));
        return Ok(());
    }

    telemetry::init_logging(cli.debug)?;

    let identity = HarnessIdentity::current();
    let _span = info_span!("dirq_test", pid = identity.pid).entered();

    let plan = cli.into_plan()?;

    if !plan.sleep.is_zero() {
        info!(seconds = plan.sleep.as_secs(), "Sleeping before start");
        std::thread::sleep(plan.sleep);
    }

    let factory = Arc::new(SimpleQueueFactory::new(Arc::new(SystemTimeProvider)));
    let mut runner = ScenarioRunner::new(factory, plan.config);

    debug!(scenario = %plan.scenario, started_at = %identity.started_at, "starting");
    let started = Instant::now();
    let outcome = match plan.scenario {
        ScenarioKind::Simple => {
            Outcome::Composite(run_simple(&mut runner, Arc::new(FsStorageProbe))?)
        }
        kind => Outcome::Scenario(runner.run(kind)?),
    };
    debug!("done in {:.4} seconds", started.elapsed().as_secs_f64());

    report::print(&outcome, plan.json)
}

/// Run the composite pipeline, then delete the queue root it created
///
/// A root that existed beforehand belongs to someone else and is left alone.
fn run_simple(
    runner: &mut ScenarioRunner,
    probe: Arc<dyn StorageProbe>,
) -> dirq_test_core::Result<CompositeReport> {
    let root = runner.config().queue.path.clone();
    let created_here = !probe.exists(&root);

    let result = CompositeValidator::new(probe).validate(runner);
    if created_here {
        cleanup(&root);
    }
    result
}

fn cleanup(root: &Path) {
    match fs::remove_dir_all(root) {
        Ok(()) => debug!(root = %root.display(), "queue root removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(root = %root.display(), error = %e, "Failed to remove queue root"),
    }
}
