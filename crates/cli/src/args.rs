// Command-line surface and its conversion into a harness plan

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use dirq_test_core::domain::{
    DomainError, HarnessConfig, QueueOptions, QueueType, ScenarioKind,
};
use dirq_test_core::error::{AppError, Result};

#[derive(Parser, Debug)]
#[command(name = "dirq-test")]
#[command(about = "Stress and interoperability tests for directory queues", long_about = None)]
#[command(version, allow_negative_numbers = true)]
pub struct Cli {
    /// Set the elements count (-1 = unbounded / one pass)
    #[arg(short, long, default_value_t = -1)]
    pub count: i64,

    /// Show debugging information
    #[arg(short, long)]
    pub debug: bool,

    /// Set header for added elements
    #[arg(long)]
    pub header: bool,

    /// List available tests
    #[arg(short, long)]
    pub list: bool,

    /// Time granularity for intermediate directories (-1 = default)
    #[arg(long, default_value_t = -1)]
    pub granularity: i64,

    /// Maximum time for a locked element (or 0 to disable purging)
    #[arg(long, default_value_t = -1)]
    pub maxlock: i64,

    /// Maximum time for a temporary element (or 0 to disable purging)
    #[arg(long, default_value_t = -1)]
    pub maxtemp: i64,

    /// Set the queue path
    #[arg(short, long, env = "DIRQ_TEST_PATH", default_value = "")]
    pub path: String,

    /// Randomize the body size
    #[arg(short, long)]
    pub random: bool,

    /// Set the random hexadecimal digit for the queue (-1 = random)
    #[arg(long, default_value_t = -1)]
    pub rndhex: i64,

    /// Set the body size for added elements (-1 = short text body)
    #[arg(short, long, default_value_t = -1)]
    pub size: i64,

    /// Sleep this amount of seconds before starting
    #[arg(long, default_value_t = 0)]
    pub sleep: u64,

    /// DirQ type (simple|normal)
    #[arg(long = "type", default_value = "simple")]
    pub queue_type: String,

    /// Set the umask for the queue, octal with a leading 0 (-1 = default)
    #[arg(long, default_value = "-1", value_parser = parse_umask)]
    pub umask: i64,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Test to run: add count get iterate purge remove simple
    pub test: Option<String>,
}

/// Everything needed to run one scenario
#[derive(Debug)]
pub struct Plan {
    pub scenario: ScenarioKind,
    pub config: HarnessConfig,
    pub sleep: Duration,
    pub json: bool,
}

impl Cli {
    /// Validate the arguments and convert `-1` sentinels into absent values
    ///
    /// Nothing touches the queue before this succeeds.
    pub fn into_plan(self) -> Result<Plan> {
        let scenario: ScenarioKind = self
            .test
            .as_deref()
            .ok_or_else(|| AppError::Config("missing test name".to_string()))?
            .parse()?;
        let queue_type: QueueType = self.queue_type.parse()?;

        if self.path.is_empty() {
            return Err(AppError::Config(
                "Option is mandatory: -p/--path".to_string(),
            ));
        }

        let mut queue = QueueOptions::new(PathBuf::from(
            shellexpand::tilde(&self.path).into_owned(),
        ));
        queue.queue_type = queue_type;
        queue.granularity = optional("granularity", self.granularity)?;
        queue.rndhex = optional("rndhex", self.rndhex)?;
        queue.umask = optional("umask", self.umask)?;
        queue.max_lock = optional("maxlock", self.maxlock)?;
        queue.max_temp = optional("maxtemp", self.maxtemp)?;
        queue.validate()?;

        let mut config = HarnessConfig::new(queue);
        config.count = optional("count", self.count)?;
        config.size = optional("size", self.size)?;
        config.random = self.random;
        config.header = self.header;

        Ok(Plan {
            scenario,
            config,
            sleep: Duration::from_secs(self.sleep),
            json: self.json,
        })
    }
}

/// Negative values mean "not set"
fn optional<T: TryFrom<i64>>(option: &'static str, value: i64) -> Result<Option<T>> {
    if value < 0 {
        return Ok(None);
    }
    T::try_from(value).map(Some).map_err(|_| {
        AppError::Domain(DomainError::InvalidOption {
            option,
            reason: format!("{} is out of range", value),
        })
    })
}

/// Umask values are octal when written with a leading 0 or 0o
fn parse_umask(s: &str) -> std::result::Result<i64, String> {
    let parsed = if let Some(octal) = s.strip_prefix("0o") {
        i64::from_str_radix(octal, 8)
    } else if s.len() > 1 && s.starts_with('0') {
        i64::from_str_radix(&s[1..], 8)
    } else {
        s.parse::<i64>()
    };
    parsed.map_err(|e| format!("invalid umask {:?}: {}", s, e))
}
