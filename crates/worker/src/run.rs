use anyhow::Context;
use holdings_core::config::Settings;
use holdings_core::domain::report::{ChangeKind, ChangeReport};
use holdings_core::edgar::{Cik, EdgarClient, FilingSource};
use holdings_core::{export, pipeline};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub label: String,
    pub output_dir: PathBuf,
    pub dry_run: bool,
}

pub async fn fetch(
    settings: &Settings,
    cik: &str,
    feed_count: Option<usize>,
    opts: &RunOptions,
) -> anyhow::Result<()> {
    let cik = Cik::parse(cik)?;

    let mut client = EdgarClient::from_settings(settings)?;
    if let Some(n) = feed_count {
        client = client.with_feed_count(n);
    }

    let comparison = pipeline::compare_latest(&client, &cik).await?;
    tracing::debug!(
        summary = %comparison.summary(client.source_name(), &cik),
        "comparison summary"
    );

    finish(&comparison.report, opts)
}

pub fn compare(recent: &Path, prior: &Path, opts: &RunOptions) -> anyhow::Result<()> {
    let recent_xml = std::fs::read_to_string(recent)
        .with_context(|| format!("failed to read {}", recent.display()))?;
    let prior_xml = std::fs::read_to_string(prior)
        .with_context(|| format!("failed to read {}", prior.display()))?;

    let report = pipeline::compare_documents(&recent_xml, &prior_xml)?;
    finish(&report, opts)
}

fn finish(report: &ChangeReport, opts: &RunOptions) -> anyhow::Result<()> {
    tracing::info!(
        label = %opts.label,
        rows = report.len(),
        continuing = report.count(ChangeKind::Continuing),
        new = report.count(ChangeKind::New),
        liquidated = report.count(ChangeKind::Liquidated),
        undefined = report.undefined_count(),
        dry_run = opts.dry_run,
        "holdings change report ready"
    );

    if opts.dry_run {
        return Ok(());
    }

    export::write_report(&opts.output_dir, &opts.label, report)?;
    Ok(())
}
