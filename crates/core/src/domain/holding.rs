use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One `infoTable` row exactly as it appears in a filing document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HoldingRecord {
    pub name: String,
    pub class: String,
    pub value: String,
    pub shares: String,
    #[serde(rename = "type")]
    pub share_type: String,
}

/// A holding whose numeric fields have been coerced. `None` means the source
/// text was empty or not a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub name: String,
    pub class: String,
    pub value: Option<f64>,
    pub shares: Option<f64>,
    #[serde(rename = "type")]
    pub share_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub reporting_date: Option<NaiveDate>,
    pub holdings: Vec<Holding>,
}

impl Snapshot {
    pub fn new(reporting_date: Option<NaiveDate>, holdings: Vec<Holding>) -> Self {
        Self {
            reporting_date,
            holdings,
        }
    }

    pub fn from_records(reporting_date: Option<NaiveDate>, records: &[HoldingRecord]) -> Self {
        Self::new(reporting_date, crate::diff::normalize::normalize(records))
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}
