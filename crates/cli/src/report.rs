// Report rendering (table or JSON on stdout)

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

use dirq_test_core::domain::{CompositeReport, ScenarioReport};

/// What a harness run produced
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Scenario(ScenarioReport),
    Composite(CompositeReport),
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Scenario")]
    scenario: String,
    #[tabled(rename = "Done")]
    done: u64,
    #[tabled(rename = "Seconds")]
    seconds: String,
    #[tabled(rename = "Purged")]
    purged: String,
}

impl From<&ScenarioReport> for ReportRow {
    fn from(report: &ScenarioReport) -> Self {
        let purged = match report.purge {
            Some(stats) => format!(
                "{} lck / {} tmp / {} dir",
                stats.locks_released, stats.temps_removed, stats.dirs_removed
            ),
            None => "-".to_string(),
        };
        Self {
            scenario: report.scenario.to_string(),
            done: report.done,
            seconds: format!("{:.4}", report.elapsed.as_secs_f64()),
            purged,
        }
    }
}

pub fn render_json(outcome: &Outcome) -> Result<String> {
    serde_json::to_string_pretty(outcome).context("Failed to serialize report")
}

pub fn render_table(outcome: &Outcome) -> String {
    let rows: Vec<ReportRow> = match outcome {
        Outcome::Scenario(report) => vec![ReportRow::from(report)],
        Outcome::Composite(report) => report.stages.iter().map(ReportRow::from).collect(),
    };
    Table::new(rows).to_string()
}

/// Print the outcome to stdout
pub fn print(outcome: &Outcome, json: bool) -> Result<()> {
    if json {
        println!("{}", render_json(outcome)?);
        return Ok(());
    }

    match outcome {
        Outcome::Scenario(report) => {
            println!(
                "{}",
                format!("✓ {} finished", report.scenario).green().bold()
            );
        }
        Outcome::Composite(report) => {
            println!(
                "{}",
                format!(
                    "✓ simple pipeline passed ({} residual entry, {:.4} seconds)",
                    report.residual_entries,
                    report.elapsed.as_secs_f64()
                )
                .green()
                .bold()
            );
        }
    }
    println!();
    println!("{}", render_table(outcome));
    Ok(())
}
