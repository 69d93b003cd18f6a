use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Held in both snapshots.
    Continuing,
    /// Only in the recent snapshot.
    New,
    /// Only in the prior snapshot.
    Liquidated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRow {
    pub name: String,
    pub class: String,
    pub value: Option<f64>,
    pub shares: Option<f64>,
    #[serde(rename = "type")]
    pub share_type: String,
    /// `None` when the prior share count is zero or either side is missing.
    pub shares_pct_change: Option<f64>,
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeReport {
    pub rows: Vec<ChangeRow>,
}

impl ChangeReport {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.rows.iter().filter(|r| r.kind == kind).count()
    }

    pub fn undefined_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.shares_pct_change.is_none())
            .count()
    }

    pub fn get(&self, name: &str) -> Option<&ChangeRow> {
        self.rows.iter().find(|r| r.name == name)
    }
}
