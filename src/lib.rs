//! Instrument alerts. Flags report rows that need follow-up and mails
//! each responsible party their own list.

pub mod channels;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod source;

use tracing::info;

use crate::error::Result;
use crate::pipeline::processor::{ReportProcessor, RunReport};
use crate::pipeline::rules::RuleSet;

/// Load the configured report and run it through the pipeline.
///
/// Only configuration and load failures are errors; delivery problems are
/// recorded per recipient in the returned report.
pub async fn run(config: &config::AppConfig) -> Result<RunReport> {
    let notifier = config.email.notifier()?;
    let records = source::load_table(&config.source_path)?;

    let processor = ReportProcessor::new(
        RuleSet::default_rules(),
        config.override_address.clone(),
        notifier,
    );
    let report = processor.run(&records).await;

    info!(run_id = %report.run_id, "Process finished");
    Ok(report)
}
