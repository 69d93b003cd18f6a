use crate::diff;
use crate::domain::holding::Snapshot;
use crate::domain::report::{ChangeKind, ChangeReport};
use crate::edgar::info_table::parse_information_table;
use crate::edgar::{Cik, FilingRef, FilingSource};
use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Comparison {
    pub recent: FilingRef,
    pub prior: FilingRef,
    pub report: ChangeReport,
}

impl Comparison {
    /// Run metadata suitable for logging or an error report.
    pub fn summary(&self, source: &str, cik: &Cik) -> Value {
        let mut summary = report_summary(&self.report);
        if let Value::Object(map) = &mut summary {
            map.insert("source".into(), serde_json::json!(source));
            map.insert("cik".into(), serde_json::json!(cik.as_str()));
            map.insert("recent".into(), serde_json::json!(self.recent));
            map.insert("prior".into(), serde_json::json!(self.prior));
            map.insert("generated_at".into(), serde_json::json!(Utc::now()));
        }
        summary
    }
}

pub fn report_summary(report: &ChangeReport) -> Value {
    serde_json::json!({
        "rows": report.len(),
        "continuing": report.count(ChangeKind::Continuing),
        "new": report.count(ChangeKind::New),
        "liquidated": report.count(ChangeKind::Liquidated),
        "undefined": report.undefined_count(),
    })
}

/// Diffs the two newest filings listed for `cik`. Any upstream failure aborts
/// before a report exists.
pub async fn compare_latest(source: &dyn FilingSource, cik: &Cik) -> Result<Comparison> {
    let filings = source
        .list_filings(cik)
        .await
        .with_context(|| format!("failed to list filings for CIK {cik}"))?;

    anyhow::ensure!(
        filings.len() >= 2,
        "need at least two 13F filings for CIK {cik} (found {})",
        filings.len()
    );

    let mut latest = filings.into_iter().take(2);
    let (Some(recent), Some(prior)) = (latest.next(), latest.next()) else {
        anyhow::bail!("need at least two 13F filings for CIK {cik}");
    };

    let recent_snapshot = load_snapshot(source, &recent).await?;
    let prior_snapshot = load_snapshot(source, &prior).await?;

    let report = diff::diff(&recent_snapshot, &prior_snapshot);
    tracing::info!(
        %cik,
        recent_report_date = ?recent.report_date,
        prior_report_date = ?prior.report_date,
        rows = report.len(),
        "compared latest filings"
    );

    Ok(Comparison {
        recent,
        prior,
        report,
    })
}

async fn load_snapshot(source: &dyn FilingSource, filing: &FilingRef) -> Result<Snapshot> {
    tracing::info!(
        report_date = ?filing.report_date,
        filing_href = %filing.filing_href,
        "loading filing"
    );

    let records = source
        .fetch_holdings(filing)
        .await
        .with_context(|| format!("failed to load holdings from {}", filing.filing_href))?;

    Ok(Snapshot::from_records(filing.report_date, &records))
}

/// Diffs two information-table documents already in memory, recent first.
pub fn compare_documents(recent_xml: &str, prior_xml: &str) -> Result<ChangeReport> {
    let recent = parse_information_table(recent_xml).context("recent document")?;
    let prior = parse_information_table(prior_xml).context("prior document")?;

    Ok(diff::diff(
        &Snapshot::from_records(None, &recent),
        &Snapshot::from_records(None, &prior),
    ))
}
