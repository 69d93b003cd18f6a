use crate::domain::holding::{Holding, HoldingRecord};

/// Parses a numeric field from a filing. Thousands separators are accepted;
/// anything else that does not parse to a finite number yields `None`.
pub fn parse_number(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }

    let cleaned;
    let t = if t.contains(',') {
        cleaned = t.replace(',', "");
        cleaned.as_str()
    } else {
        t
    };

    t.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn normalize(records: &[HoldingRecord]) -> Vec<Holding> {
    records.iter().map(HoldingRecord::to_holding).collect()
}

impl HoldingRecord {
    pub fn to_holding(&self) -> Holding {
        Holding {
            name: self.name.clone(),
            class: self.class.clone(),
            value: parse_number(&self.value),
            shares: parse_number(&self.shares),
            share_type: self.share_type.clone(),
        }
    }
}
