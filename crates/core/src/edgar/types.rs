use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// SEC Central Index Key, always held in its 10-digit zero-padded form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cik(String);

impl Cik {
    pub fn parse(s: &str) -> Result<Self> {
        let t = s.trim();
        anyhow::ensure!(!t.is_empty(), "CIK must be non-empty");
        anyhow::ensure!(
            t.chars().all(|c| c.is_ascii_digit()),
            "CIK must contain only digits (got {t:?})"
        );
        anyhow::ensure!(t.len() <= 10, "CIK must be at most 10 digits (got {t})");
        Ok(Self(format!("{t:0>10}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cik {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One filing listed in a filer's EDGAR feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingRef {
    pub filing_href: String,
    pub filing_type: Option<String>,
    pub accession_number: Option<String>,
    pub filing_date: Option<NaiveDate>,
    pub report_date: Option<NaiveDate>,
}

impl FilingRef {
    pub fn new(filing_href: impl Into<String>) -> Self {
        Self {
            filing_href: filing_href.into(),
            filing_type: None,
            accession_number: None,
            filing_date: None,
            report_date: None,
        }
    }

    /// Directory holding the filing's documents (the index URL up to its last `/`).
    pub fn base_url(&self) -> &str {
        match self.filing_href.rfind('/') {
            Some(i) => &self.filing_href[..i],
            None => &self.filing_href,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_cik_to_ten_digits() {
        assert_eq!(Cik::parse("1067983").unwrap().as_str(), "0001067983");
        assert_eq!(Cik::parse(" 0001067983 ").unwrap().as_str(), "0001067983");
        assert_eq!(Cik::parse("1").unwrap().to_string(), "0000000001");
    }

    #[test]
    fn rejects_bad_cik() {
        assert!(Cik::parse("").is_err());
        assert!(Cik::parse("12a4").is_err());
        assert!(Cik::parse("12345678901").is_err());
    }

    #[test]
    fn base_url_strips_index_file() {
        let f = FilingRef::new(
            "https://www.sec.gov/Archives/edgar/data/1067983/000095012324011775/0000950123-24-011775-index.htm",
        );
        assert_eq!(
            f.base_url(),
            "https://www.sec.gov/Archives/edgar/data/1067983/000095012324011775"
        );
    }
}
