//! Change report as a CSV table:
//! name,class,value,shares,type,shares_pct_change

use crate::domain::report::{ChangeReport, ChangeRow};
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(serde::Serialize)]
struct CsvOutRow<'a> {
    name: &'a str,
    class: &'a str,
    value: Option<String>,
    shares: Option<String>,
    #[serde(rename = "type")]
    share_type: &'a str,
    shares_pct_change: Option<f64>,
}

impl<'a> From<&'a ChangeRow> for CsvOutRow<'a> {
    fn from(r: &'a ChangeRow) -> Self {
        Self {
            name: &r.name,
            class: &r.class,
            value: r.value.map(plain_number),
            shares: r.shares.map(plain_number),
            share_type: &r.share_type,
            shares_pct_change: r.shares_pct_change,
        }
    }
}

// Counts as filed: 1000 stays "1000", fractional amounts keep their digits.
fn plain_number(v: f64) -> String {
    v.to_string()
}

/// A label becomes a file name, so it must be a single non-empty path component.
pub fn validate_label(label: &str) -> Result<()> {
    let trimmed = label.trim();
    anyhow::ensure!(!trimmed.is_empty(), "report label must be non-empty");
    anyhow::ensure!(
        !label.contains(['/', '\\']) && trimmed != "." && trimmed != "..",
        "report label {label:?} must not contain path separators or be '.' or '..'"
    );
    Ok(())
}

pub fn report_path(dir: &Path, label: &str) -> PathBuf {
    dir.join(format!("{label}.csv"))
}

pub fn write_csv<W: Write>(w: W, report: &ChangeReport) -> Result<()> {
    let mut wrt = WriterBuilder::new().has_headers(true).from_writer(w);

    if report.is_empty() {
        // serde only emits the header together with the first record.
        wrt.write_record([
            "name",
            "class",
            "value",
            "shares",
            "type",
            "shares_pct_change",
        ])?;
    }

    for row in &report.rows {
        wrt.serialize(CsvOutRow::from(row))
            .with_context(|| format!("failed to write report row for {}", row.name))?;
    }
    wrt.flush().context("failed to flush report")?;
    Ok(())
}

/// Writes `<dir>/<label>.csv` and returns its path.
pub fn write_report(dir: &Path, label: &str, report: &ChangeReport) -> Result<PathBuf> {
    validate_label(label)?;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output dir {}", dir.display()))?;

    let path = report_path(dir, label);
    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    write_csv(file, report)?;

    tracing::info!(path = %path.display(), rows = report.len(), "wrote change report");
    Ok(path)
}
