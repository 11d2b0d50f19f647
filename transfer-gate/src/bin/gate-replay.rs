//! Scenario replay binary
//!
//! Usage: `gate-replay <scenario.toml>`
//!
//! Prints one JSON object per line on stdout; logs go to stderr.

use anyhow::Context;
use std::io::Write;
use tracing_subscriber::filter::Directive;
use transfer_gate::replay::{replay, Scenario};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .context("usage: gate-replay <scenario.toml>")?;

    let scenario = Scenario::from_file(&path)
        .with_context(|| format!("Failed to load scenario {}", path))?;

    // Initialize tracing
    let default_directive = scenario
        .config
        .log_level
        .parse::<Directive>()
        .with_context(|| format!("Invalid log level {:?}", scenario.config.log_level))?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_directive),
        )
        .init();

    tracing::info!(
        scenario = %path,
        steps = scenario.steps.len(),
        "Starting transfer gate replay"
    );

    let records = replay(&scenario).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for record in &records {
        serde_json::to_writer(&mut out, record)?;
        writeln!(out)?;
    }

    Ok(())
}
