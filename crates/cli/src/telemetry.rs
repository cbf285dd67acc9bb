//! Logging setup for the harness binary

use anyhow::{Context, Result};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d-%H:%M:%S";

const INFO_DIRECTIVES: &str = "dirq_test=info,dirq_test_core=info,dirq_infra_fs=info";
const DEBUG_DIRECTIVES: [&str; 3] = [
    "dirq_test=debug",
    "dirq_test_core=debug",
    "dirq_infra_fs=debug",
];

/// Initialize the global tracing subscriber
///
/// Log lines go to stderr so that reports printed on stdout stay parseable.
///
/// # Environment Variables
///
/// - `RUST_LOG`: filter directives; `--debug` adds debug level for the harness crates on top
/// - `DIRQ_TEST_LOG_FORMAT`: `json` or `compact` (default)
pub fn init_logging(debug: bool) -> Result<()> {
    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let env_filter = build_filter(env_directives.as_deref(), debug)?;

    let log_format =
        std::env::var("DIRQ_TEST_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());
    let timer = ChronoLocal::new(TIMESTAMP_FORMAT.to_string());

    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_timer(timer)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_timer(timer)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    }
    .context("Failed to install tracing subscriber")
}

/// `RUST_LOG` directives when present and valid, the info defaults otherwise
fn build_filter(env_directives: Option<&str>, debug: bool) -> Result<EnvFilter> {
    let mut filter = env_directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .map_or_else(|| EnvFilter::try_new(INFO_DIRECTIVES), Ok)
        .context("Failed to create env filter")?;

    if debug {
        for directive in DEBUG_DIRECTIVES {
            let directive: Directive = directive
                .parse()
                .with_context(|| format!("Invalid log directive {}", directive))?;
            filter = filter.add_directive(directive);
        }
    }
    Ok(filter)
}
