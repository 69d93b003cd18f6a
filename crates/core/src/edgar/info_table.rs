use crate::domain::holding::HoldingRecord;
use crate::edgar::xml::{ends_with, walk, XmlNode};
use anyhow::{Context, Result};

/// Parses a 13F information table into raw records, one per `infoTable`.
/// Child elements that are absent leave the field empty.
pub fn parse_information_table(xml: &str) -> Result<Vec<HoldingRecord>> {
    let mut out = Vec::new();
    let mut current: Option<HoldingRecord> = None;

    walk(xml, |path, node| match node {
        XmlNode::Start if ends_with(path, &["infoTable"]) => {
            current = Some(HoldingRecord::default());
        }
        XmlNode::End if ends_with(path, &["infoTable"]) => {
            if let Some(record) = current.take() {
                out.push(record);
            }
        }
        XmlNode::Text(text) => {
            let Some(record) = current.as_mut() else {
                return;
            };
            let slot = if ends_with(path, &["infoTable", "nameOfIssuer"]) {
                &mut record.name
            } else if ends_with(path, &["infoTable", "titleOfClass"]) {
                &mut record.class
            } else if ends_with(path, &["infoTable", "value"]) {
                &mut record.value
            } else if ends_with(path, &["shrsOrPrnAmt", "sshPrnamt"]) {
                &mut record.shares
            } else if ends_with(path, &["shrsOrPrnAmt", "sshPrnamtType"]) {
                &mut record.share_type
            } else {
                return;
            };
            *slot = text.to_string();
        }
        _ => {}
    })
    .context("failed to parse information table")?;

    tracing::info!(holdings = out.len(), "parsed information table");
    Ok(out)
}
