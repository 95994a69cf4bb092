//! Library-level checks of reconciliation invariants over a mixed breakpoint set

use fusbench::config::ComparisonConfig;
use fusbench::reconcile::{reconcile, MatchType, Reconciliation};
use std::collections::BTreeSet;

const TRUTH: &[&str] = &[
    "chr1:1000--chr2:5000",
    "chr1:2000--chr3:7000",
    "chr5:300--chr5:900",
    "chr7:55000--chr12:100",
    "chrX:10--chrY:20",
    "junk",
];

const PREDICTIONS: &[&str] = &[
    "chr2:5000--chr1:1000",
    "chr1:2004--chr3:6990",
    "chr5:330--chr5:905",
    "chr7:56000--chr12:100",
    "chr9:1--chr10:2",
    "chr1:2002--chr3:7001",
];

fn reconcile_with_window(window: u32) -> Reconciliation {
    reconcile(TRUTH, PREDICTIONS, &ComparisonConfig::default().with_window(window)).unwrap()
}

fn matched_truth(reconciliation: &Reconciliation) -> BTreeSet<String> {
    reconciliation
        .truth_records()
        .filter(|r| r.match_type.is_matched())
        .filter_map(|r| r.truth.clone())
        .collect()
}

#[test]
fn test_window_monotonicity() {
    let mut previous: BTreeSet<String> = BTreeSet::new();
    for window in [0, 2, 10, 40, 100, 5000] {
        let matched = matched_truth(&reconcile_with_window(window));
        assert!(
            previous.is_subset(&matched),
            "window {window} lost matches: {previous:?} -> {matched:?}"
        );
        previous = matched;
    }
    assert_eq!(previous.len(), 4);
}

#[test]
fn test_every_key_accounted_once() {
    for window in [0, 10, 100] {
        let reconciliation = reconcile_with_window(window);

        let truth: Vec<&str> = reconciliation
            .records
            .iter()
            .filter_map(|r| r.truth.as_deref())
            .collect();
        let unique_truth: BTreeSet<&str> = truth.iter().copied().collect();
        assert_eq!(truth.len(), unique_truth.len());
        assert_eq!(truth.len(), reconciliation.truth_total);

        // a prediction may be shared by several matched truth keys, but a matched
        // prediction is never also reported on its own
        let matched: BTreeSet<&str> = reconciliation
            .truth_records()
            .flat_map(|r| r.predictions.iter().map(|p| p.key.as_str()))
            .collect();
        let unmatched: Vec<&str> = reconciliation
            .records
            .iter()
            .filter(|r| r.truth.is_none())
            .flat_map(|r| r.predictions.iter().map(|p| p.key.as_str()))
            .collect();
        assert!(unmatched.iter().all(|key| !matched.contains(key)));
        assert_eq!(matched.len() + unmatched.len(), reconciliation.prediction_total);
        assert_eq!(
            reconciliation.metrics().false_positives,
            unmatched.len(),
            "window {window}"
        );
    }
}

#[test]
fn test_identity_reconciliation() {
    let keys = &TRUTH[..5];
    for window in [0, 10] {
        let reconciliation =
            reconcile(keys, keys, &ComparisonConfig::default().with_window(window)).unwrap();
        assert_eq!(reconciliation.count(MatchType::ExactMatched), keys.len());
        assert_eq!(reconciliation.records.len(), keys.len());
        let metrics = reconciliation.metrics();
        assert_eq!(metrics.false_positives, 0);
        assert_eq!(metrics.sensitivity, Some(1.0));
    }
}

#[test]
fn test_window_buckets() {
    let reconciliation = reconcile_with_window(10);
    let by_truth = |key: &str| {
        reconciliation
            .records
            .iter()
            .find(|r| r.truth.as_deref() == Some(key))
            .map(|r| r.match_type)
    };

    assert_eq!(by_truth("chr1:1000--chr2:5000"), Some(MatchType::ExactMatched));
    assert_eq!(by_truth("chr1:2000--chr3:7000"), Some(MatchType::InexactMatched));
    assert_eq!(by_truth("chr5:300--chr5:900"), Some(MatchType::InexactUnmatched));
    // no prediction on chrX/chrY at all
    assert_eq!(by_truth("chrX:10--chrY:20"), Some(MatchType::InexactUnmatched));
    assert_eq!(by_truth("junk"), Some(MatchType::InexactUnmatched));

    let window_matched = reconciliation
        .records
        .iter()
        .find(|r| r.match_type == MatchType::InexactMatched)
        .unwrap();
    assert_eq!(window_matched.predictions.len(), 1);
    assert_eq!(window_matched.predictions[0].key, "chr1:2002--chr3:7001");

    let closest = reconciliation
        .records
        .iter()
        .find(|r| r.truth.as_deref() == Some("chr5:300--chr5:900"))
        .and_then(|r| r.closest.clone())
        .unwrap();
    assert_eq!(closest.key, "chr5:330--chr5:905");
    assert_eq!(closest.distances.max, 30);
}
