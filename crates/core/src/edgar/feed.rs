//! EDGAR company filing feed (Atom). Each `<entry>` carries the filing's
//! metadata inside `<content>` as plain child elements.

use crate::edgar::types::FilingRef;
use crate::edgar::xml::{walk, XmlNode};
use anyhow::Result;
use chrono::NaiveDate;

pub const FILING_TYPES: &str = "13F-HR,13F-HR/A";

pub fn feed_url(base_url: &str, cik: &crate::edgar::types::Cik, count: usize) -> String {
    format!(
        "{}/rss?cik={cik}&type={FILING_TYPES}&only=true&count={count}",
        base_url.trim_end_matches('/')
    )
}

#[derive(Debug, Default)]
struct EntryFields {
    filing_href: Option<String>,
    filing_type: Option<String>,
    accession_number: Option<String>,
    filing_date: Option<String>,
    report_date: Option<String>,
}

/// Parses the feed into filings, keeping feed order (newest first).
pub fn parse_feed(xml: &str) -> Result<Vec<FilingRef>> {
    let mut out = Vec::new();
    let mut current: Option<EntryFields> = None;

    walk(xml, |path, node| {
        let Some(tag) = path.last().map(String::as_str) else {
            return;
        };

        match (tag, node) {
            ("entry", XmlNode::Start) => current = Some(EntryFields::default()),
            ("entry", XmlNode::End) => {
                if let Some(fields) = current.take() {
                    if let Some(filing) = into_filing(fields) {
                        out.push(filing);
                    }
                }
            }
            (_, XmlNode::Text(text)) => {
                let Some(fields) = current.as_mut() else {
                    return;
                };
                let slot = match tag {
                    "filing-href" => &mut fields.filing_href,
                    "filing-type" => &mut fields.filing_type,
                    // EDGAR's own feed spells it "nunber".
                    "accession-number" | "accession-nunber" => &mut fields.accession_number,
                    "filing-date" => &mut fields.filing_date,
                    "report-date" => &mut fields.report_date,
                    _ => return,
                };
                *slot = Some(text.to_string());
            }
            _ => {}
        }
    })?;

    tracing::debug!(entries = out.len(), "parsed filing feed");
    Ok(out)
}

fn into_filing(fields: EntryFields) -> Option<FilingRef> {
    let Some(filing_href) = fields.filing_href.filter(|s| !s.trim().is_empty()) else {
        tracing::warn!(
            accession_number = ?fields.accession_number,
            "feed entry has no filing-href; skipping"
        );
        return None;
    };

    Some(FilingRef {
        filing_href: filing_href.trim().to_string(),
        filing_type: fields.filing_type,
        accession_number: fields.accession_number,
        filing_date: fields.filing_date.as_deref().and_then(parse_date),
        report_date: fields.report_date.as_deref().and_then(parse_date),
    })
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let t = s.trim();
    // Some feeds append a time component; only the date matters here.
    let t = t.get(..10).unwrap_or(t);
    match NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        Ok(d) => Some(d),
        Err(err) => {
            tracing::warn!(value = %s, error = %err, "unparseable feed date");
            None
        }
    }
}
