use crate::domain::holding::{Holding, Snapshot};
use crate::domain::report::{ChangeKind, ChangeReport, ChangeRow};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Marker for a position that only exists in the recent snapshot.
pub const NEW_POSITION_PCT: f64 = 100.0;
/// Marker for a position that only exists in the prior snapshot.
pub const LIQUIDATED_POSITION_PCT: f64 = -100.0;

/// Reconciles `recent` against `prior` by issuer name and returns the report
/// ranked by share-count change, largest increase first.
///
/// Rows sharing a name inside one snapshot are consolidated first, so every
/// distinct name appears exactly once in the output. Descriptive fields come
/// from the recent side whenever the name exists there.
pub fn diff(recent: &Snapshot, prior: &Snapshot) -> ChangeReport {
    let recent = consolidate(&recent.holdings);
    let prior = consolidate(&prior.holdings);

    let recent_names: HashSet<&str> = recent.iter().map(|h| h.name.as_str()).collect();
    let prior_by_name: HashMap<&str, &Holding> =
        prior.iter().map(|h| (h.name.as_str(), h)).collect();

    let mut common = Vec::new();
    let mut added = Vec::new();
    for holding in &recent {
        match prior_by_name.get(holding.name.as_str()) {
            Some(prev) => {
                let pct = pct_change(holding.shares, prev.shares);
                if pct.is_none() {
                    tracing::debug!(
                        name = %holding.name,
                        recent_shares = ?holding.shares,
                        prior_shares = ?prev.shares,
                        "share change undefined"
                    );
                }
                common.push(change_row(holding, pct, ChangeKind::Continuing));
            }
            None => added.push(change_row(
                holding,
                Some(NEW_POSITION_PCT),
                ChangeKind::New,
            )),
        }
    }

    let liquidated = prior
        .iter()
        .filter(|h| !recent_names.contains(h.name.as_str()))
        .map(|h| change_row(h, Some(LIQUIDATED_POSITION_PCT), ChangeKind::Liquidated));

    let mut rows = common;
    rows.extend(added);
    rows.extend(liquidated);
    rows.sort_by(rank_order);

    ChangeReport { rows }
}

/// Percentage change from `prior` to `recent`, rounded to two decimals.
/// Undefined when either side is missing or the prior count is zero.
pub fn pct_change(recent: Option<f64>, prior: Option<f64>) -> Option<f64> {
    let (recent, prior) = (recent?, prior?);
    if prior == 0.0 {
        return None;
    }

    let pct = round2((recent - prior) / prior * 100.0);
    // Avoid emitting "-0" for tiny decreases.
    let pct = if pct == 0.0 { 0.0 } else { pct };
    pct.is_finite().then_some(pct)
}

// Exact halves go to the even neighbour (0.125 -> 0.12), as pandas does.
fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

fn change_row(h: &Holding, shares_pct_change: Option<f64>, kind: ChangeKind) -> ChangeRow {
    ChangeRow {
        name: h.name.clone(),
        class: h.class.clone(),
        value: h.value,
        shares: h.shares,
        share_type: h.share_type.clone(),
        shares_pct_change,
        kind,
    }
}

// Descending by change; undefined changes last; then by name.
fn rank_order(a: &ChangeRow, b: &ChangeRow) -> Ordering {
    let by_pct = match (a.shares_pct_change, b.shares_pct_change) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_pct.then_with(|| a.name.cmp(&b.name))
}

/// Merges rows that share a name. Text fields come from the first row;
/// numeric fields are summed over the rows that have them.
fn consolidate(holdings: &[Holding]) -> Vec<Holding> {
    let mut out: Vec<Holding> = Vec::with_capacity(holdings.len());
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(holdings.len());

    for holding in holdings {
        match index.get(holding.name.as_str()) {
            Some(&i) => {
                let merged = &mut out[i];
                merged.value = sum_present(merged.value, holding.value);
                merged.shares = sum_present(merged.shares, holding.shares);
                tracing::debug!(name = %holding.name, "merged duplicate holding row");
            }
            None => {
                index.insert(holding.name.as_str(), out.len());
                out.push(holding.clone());
            }
        }
    }

    out
}

fn sum_present(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x + y),
        (x, None) => x,
        (None, y) => y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::holding::HoldingRecord;
    use std::collections::BTreeSet;

    fn rec(name: &str, value: &str, shares: &str) -> HoldingRecord {
        HoldingRecord {
            name: name.to_string(),
            class: "COM".to_string(),
            value: value.to_string(),
            shares: shares.to_string(),
            share_type: "SH".to_string(),
        }
    }

    fn snap(records: &[HoldingRecord]) -> Snapshot {
        Snapshot::from_records(None, records)
    }

    fn names(report: &ChangeReport) -> Vec<&str> {
        report.rows.iter().map(|r| r.name.as_str()).collect()
    }

    fn assert_non_increasing(report: &ChangeReport) {
        let pcts: Vec<f64> = report
            .rows
            .iter()
            .filter_map(|r| r.shares_pct_change)
            .collect();
        for w in pcts.windows(2) {
            assert!(w[0] >= w[1], "not ranked: {pcts:?}");
        }
    }

    #[test]
    fn acme_and_beta_example() {
        let a = snap(&[rec("Acme Corp", "1000", "50")]);
        let b = snap(&[rec("Acme Corp", "900", "40"), rec("Beta Inc", "500", "20")]);

        let report = diff(&a, &b);
        assert_eq!(names(&report), vec!["Acme Corp", "Beta Inc"]);

        let acme = &report.rows[0];
        assert_eq!(acme.shares, Some(50.0));
        assert_eq!(acme.value, Some(1000.0));
        assert_eq!(acme.shares_pct_change, Some(25.0));
        assert_eq!(acme.kind, ChangeKind::Continuing);

        let beta = &report.rows[1];
        assert_eq!(beta.shares, Some(20.0));
        assert_eq!(beta.value, Some(500.0));
        assert_eq!(beta.shares_pct_change, Some(-100.0));
        assert_eq!(beta.kind, ChangeKind::Liquidated);
    }

    #[test]
    fn covers_union_of_names_with_exclusivity_markers() {
        let a = snap(&[
            rec("Acme Corp", "1", "10"),
            rec("Gamma LLC", "1", "5"),
            rec("Delta Co", "1", "7"),
        ]);
        let b = snap(&[
            rec("Acme Corp", "1", "20"),
            rec("Beta Inc", "1", "3"),
            rec("Omega Ltd", "1", "9"),
        ]);

        let report = diff(&a, &b);
        let got: BTreeSet<&str> = names(&report).into_iter().collect();
        let want: BTreeSet<&str> = ["Acme Corp", "Gamma LLC", "Delta Co", "Beta Inc", "Omega Ltd"]
            .into_iter()
            .collect();
        assert_eq!(got, want);

        for name in ["Gamma LLC", "Delta Co"] {
            assert_eq!(report.get(name).unwrap().shares_pct_change, Some(100.0));
        }
        for name in ["Beta Inc", "Omega Ltd"] {
            assert_eq!(report.get(name).unwrap().shares_pct_change, Some(-100.0));
        }
        assert_eq!(report.get("Acme Corp").unwrap().shares_pct_change, Some(-50.0));
        assert_eq!(report.count(ChangeKind::New), 2);
        assert_eq!(report.count(ChangeKind::Liquidated), 2);
        assert_eq!(report.count(ChangeKind::Continuing), 1);
        assert_non_increasing(&report);
    }

    #[test]
    fn common_holding_rounds_to_two_decimals() {
        let a = snap(&[rec("Acme Corp", "1", "100")]);
        let b = snap(&[rec("Acme Corp", "1", "30")]);

        let report = diff(&a, &b);
        // (100 - 30) / 30 * 100 = 233.333...
        assert_eq!(report.rows[0].shares_pct_change, Some(233.33));
    }

    #[test]
    fn descriptive_fields_come_from_recent_side() {
        let a = snap(&[HoldingRecord {
            name: "Acme Corp".to_string(),
            class: "CL A".to_string(),
            value: "1200".to_string(),
            shares: "60".to_string(),
            share_type: "SH".to_string(),
        }]);
        let b = snap(&[HoldingRecord {
            name: "Acme Corp".to_string(),
            class: "COM".to_string(),
            value: "800".to_string(),
            shares: "40".to_string(),
            share_type: "PRN".to_string(),
        }]);

        let row = &diff(&a, &b).rows[0];
        assert_eq!(row.class, "CL A");
        assert_eq!(row.value, Some(1200.0));
        assert_eq!(row.share_type, "SH");
        assert_eq!(row.shares_pct_change, Some(50.0));
    }

    #[test]
    fn empty_inputs() {
        let empty = snap(&[]);
        assert!(diff(&empty, &empty).is_empty());

        let a = snap(&[rec("Acme Corp", "1", "10"), rec("Beta Inc", "1", "5")]);
        let report = diff(&a, &empty);
        assert_eq!(report.len(), 2);
        assert!(report
            .rows
            .iter()
            .all(|r| r.shares_pct_change == Some(100.0) && r.kind == ChangeKind::New));

        let report = diff(&empty, &a);
        assert!(report
            .rows
            .iter()
            .all(|r| r.shares_pct_change == Some(-100.0)));
    }

    #[test]
    fn zero_or_missing_prior_shares_is_undefined_and_sorts_last() {
        let a = snap(&[
            rec("Zero Prior", "1", "10"),
            rec("Missing Prior", "1", "10"),
            rec("Missing Recent", "1", "bad"),
            rec("Acme Corp", "1", "10"),
        ]);
        let b = snap(&[
            rec("Zero Prior", "1", "0"),
            rec("Missing Prior", "1", ""),
            rec("Missing Recent", "1", "10"),
            rec("Acme Corp", "1", "20"),
            rec("Beta Inc", "1", "20"),
        ]);

        let report = diff(&a, &b);
        assert_eq!(
            names(&report),
            vec!["Acme Corp", "Beta Inc", "Missing Prior", "Missing Recent", "Zero Prior"]
        );
        assert_eq!(report.undefined_count(), 3);
        assert!(report.rows.iter().all(|r| r
            .shares_pct_change
            .map(f64::is_finite)
            .unwrap_or(true)));
    }

    #[test]
    fn ties_break_by_name() {
        let a = snap(&[rec("Zeta", "1", "1"), rec("Alpha", "1", "1"), rec("Mid", "1", "2")]);
        let b = snap(&[rec("Mid", "1", "1"), rec("Omega", "1", "1"), rec("Beta", "1", "1")]);

        let report = diff(&a, &b);
        // Mid is +100.0 as a continuing holding and ties with the new ones.
        assert_eq!(names(&report), vec!["Alpha", "Mid", "Zeta", "Beta", "Omega"]);
    }

    #[test]
    fn duplicate_names_are_consolidated() {
        let a = snap(&[
            rec("Acme Corp", "100", "10"),
            HoldingRecord {
                name: "Acme Corp".to_string(),
                class: "CALL".to_string(),
                value: "50".to_string(),
                shares: "5".to_string(),
                share_type: "SH".to_string(),
            },
        ]);
        let b = snap(&[rec("Acme Corp", "60", "10"), rec("Acme Corp", "x", "")]);

        let report = diff(&a, &b);
        assert_eq!(report.len(), 1);
        let row = &report.rows[0];
        assert_eq!(row.class, "COM");
        assert_eq!(row.value, Some(150.0));
        assert_eq!(row.shares, Some(15.0));
        assert_eq!(row.shares_pct_change, Some(50.0));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let a = snap(&[rec("B", "1", "3"), rec("A", "1", "3"), rec("C", "1", "1")]);
        let b = snap(&[rec("A", "1", "2"), rec("D", "1", "4"), rec("C", "1", "0")]);

        let first = diff(&a, &b);
        let second = diff(&a, &b);
        assert_eq!(first, second);
        assert_non_increasing(&first);
    }

    #[test]
    fn exact_halves_round_to_even() {
        // 801 vs 800 is exactly +0.125%.
        assert_eq!(pct_change(Some(801.0), Some(800.0)), Some(0.12));
        assert_eq!(pct_change(Some(799.0), Some(800.0)), Some(-0.12));
        assert_eq!(pct_change(Some(8003.0), Some(8000.0)), Some(0.04));

        let a = snap(&[rec("Acme Corp", "1", "801")]);
        let b = snap(&[rec("Acme Corp", "1", "800")]);
        assert_eq!(diff(&a, &b).rows[0].shares_pct_change, Some(0.12));
    }

    #[test]
    fn tiny_decrease_rounds_to_positive_zero() {
        assert_eq!(pct_change(Some(999_999.0), Some(1_000_000.0)), Some(0.0));
        assert!(pct_change(Some(999_999.0), Some(1_000_000.0))
            .unwrap()
            .is_sign_positive());
        assert_eq!(pct_change(None, Some(1.0)), None);
    }
}
