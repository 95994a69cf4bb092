//! Truth-vs-prediction breakpoint reconciliation
//!
//! Exact key equality is tried first. With a non-zero window the leftovers on
//! both sides are then matched through the window indexes: the prediction
//! remainder is indexed once and every truth remainder is queried against it.
//! Every unique truth key and every unique prediction key ends up in exactly
//! one record.

use crate::breakpoint::BreakpointPair;
use crate::breakpoint_index::build_indexes;
use crate::config::ComparisonConfig;
use crate::error::{BenchError, Result};
use crate::matcher::{closest_pair, match_pair, nearest, Distances, PairMatch};
use crate::metrics::OverlapMetrics;
use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::fmt;

/// Terminal state of a truth or prediction key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchType {
    ExactMatched,
    InexactMatched,
    ExactUnmatched,
    InexactUnmatched,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::ExactMatched => "ExactMatched",
            MatchType::InexactMatched => "InexactMatched",
            MatchType::ExactUnmatched => "ExactUnmatched",
            MatchType::InexactUnmatched => "InexactUnmatched",
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, MatchType::ExactMatched | MatchType::InexactMatched)
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prediction key attached to a record, with its distances to the truth key when matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPrediction {
    pub key: String,
    pub distances: Option<Distances>,
}

/// Nearest same-chromosome prediction for a truth key left unmatched by the window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosestPrediction {
    pub key: String,
    pub distances: Distances,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub match_type: MatchType,
    /// Truth key; `None` for prediction-only records
    pub truth: Option<String>,
    /// Matched predictions in index order, or the lone unmatched prediction
    pub predictions: Vec<MatchedPrediction>,
    pub closest: Option<ClosestPrediction>,
}

impl MatchRecord {
    fn truth_only(match_type: MatchType, truth: String) -> Self {
        Self {
            match_type,
            truth: Some(truth),
            predictions: Vec::new(),
            closest: None,
        }
    }

    fn prediction_only(match_type: MatchType, prediction: String) -> Self {
        Self {
            match_type,
            truth: None,
            predictions: vec![MatchedPrediction {
                key: prediction,
                distances: None,
            }],
            closest: None,
        }
    }

    /// Distances of the nearest matched prediction (smallest max distance, first on ties)
    pub fn distances(&self) -> Option<Distances> {
        self.predictions
            .iter()
            .filter_map(|p| p.distances)
            .min_by_key(|d| d.max)
    }

    /// Prediction keys joined with `;`, the flat form used in output tables
    pub fn joined_predictions(&self) -> String {
        self.predictions
            .iter()
            .map(|p| p.key.as_str())
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// All records of one truth-vs-prediction comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub window: u32,
    pub records: Vec<MatchRecord>,
    pub truth_total: usize,
    pub prediction_total: usize,
    /// Candidate pairs found through the window indexes
    pub window_hits: usize,
}

impl Reconciliation {
    pub fn truth_records(&self) -> impl Iterator<Item = &MatchRecord> {
        self.records.iter().filter(|r| r.truth.is_some())
    }

    pub fn count(&self, match_type: MatchType) -> usize {
        self.records
            .iter()
            .filter(|r| r.match_type == match_type)
            .count()
    }

    /// Metrics over unique keys. False positives are the prediction keys no truth
    /// key consumed, i.e. the prediction-only records.
    pub fn metrics(&self) -> OverlapMetrics {
        let matched_truth = self
            .truth_records()
            .filter(|r| r.match_type.is_matched())
            .count();
        let unconsumed = self.records.iter().filter(|r| r.truth.is_none()).count();
        OverlapMetrics::new(
            matched_truth,
            self.truth_total,
            self.prediction_total - unconsumed,
            self.prediction_total,
        )
    }

    /// Truth key and distance for every matched prediction key.
    ///
    /// A prediction claimed by several truth keys goes to the nearest one, the
    /// lowest truth key on ties.
    pub fn prediction_matches(&self) -> FxHashMap<&str, (&str, u32)> {
        let mut matches: FxHashMap<&str, (&str, u32)> = FxHashMap::default();
        for record in self.records.iter().filter(|r| r.match_type.is_matched()) {
            let Some(truth) = record.truth.as_deref() else {
                continue;
            };
            for prediction in &record.predictions {
                let distance = prediction.distances.map_or(0, |d| d.max);
                match matches.get(prediction.key.as_str()) {
                    Some(&(_, best)) if best <= distance => {}
                    _ => {
                        matches.insert(prediction.key.as_str(), (truth, distance));
                    }
                }
            }
        }
        matches
    }
}

/// Comparison keys of the truth breakpoints, unique and sorted.
///
/// Repeated identical strings collapse silently; two different strings that
/// share a key (e.g. `A--B` and `B--A` under lex-sorting) mean the truth set
/// is corrupt.
pub fn truth_keys<S: AsRef<str>>(truth: &[S], config: &ComparisonConfig) -> Result<BTreeSet<String>> {
    let mut origin: FxHashMap<String, &str> = FxHashMap::default();
    for raw in truth {
        let raw = raw.as_ref();
        let key = config.breakpoint_key(raw);
        if let Some(&first) = origin.get(&key) {
            if first != raw {
                return Err(BenchError::DuplicateTruthBreakpoint {
                    key,
                    first: first.to_string(),
                    second: raw.to_string(),
                });
            }
            continue;
        }
        origin.insert(key, raw);
    }
    Ok(origin.into_keys().collect())
}

/// Classify every truth and prediction breakpoint as exactly or window matched or unmatched.
pub fn reconcile<S: AsRef<str>, P: AsRef<str>>(
    truth: &[S],
    predictions: &[P],
    config: &ComparisonConfig,
) -> Result<Reconciliation> {
    let truth = truth_keys(truth, config)?;
    let predictions: BTreeSet<String> = predictions
        .iter()
        .map(|p| config.breakpoint_key(p.as_ref()))
        .collect();

    let mut records: Vec<MatchRecord> = truth
        .intersection(&predictions)
        .map(|key| MatchRecord {
            match_type: MatchType::ExactMatched,
            truth: Some(key.clone()),
            predictions: vec![MatchedPrediction {
                key: key.clone(),
                distances: Some(Distances::default()),
            }],
            closest: None,
        })
        .collect();
    let truth_only: Vec<String> = truth.difference(&predictions).cloned().collect();
    let prediction_only: Vec<String> = predictions.difference(&truth).cloned().collect();
    debug!(
        "{} exact matches, {} truth and {} predicted breakpoints left",
        records.len(),
        truth_only.len(),
        prediction_only.len()
    );

    let mut reconciliation = Reconciliation {
        window: config.window,
        records: Vec::new(),
        truth_total: truth.len(),
        prediction_total: predictions.len(),
        window_hits: 0,
    };

    if config.window == 0 {
        records.extend(
            truth_only
                .into_iter()
                .map(|key| MatchRecord::truth_only(MatchType::ExactUnmatched, key)),
        );
        records.extend(
            prediction_only
                .into_iter()
                .map(|key| MatchRecord::prediction_only(MatchType::ExactUnmatched, key)),
        );
        reconciliation.records = records;
        return Ok(reconciliation);
    }

    let indexes = build_indexes(&prediction_only, config.window);
    let prediction_key = |pair_index: usize| indexes.key(pair_index).unwrap_or_default().to_string();
    let mut consumed = vec![false; prediction_only.len()];

    for truth_key in truth_only {
        let query = match truth_key.parse::<BreakpointPair>() {
            Ok(query) => query,
            Err(e) => {
                warn!("{}. Reporting truth breakpoint as unmatched.", e);
                records.push(MatchRecord::truth_only(MatchType::InexactUnmatched, truth_key));
                continue;
            }
        };

        match match_pair(&query, &indexes) {
            PairMatch::Matched(candidates) => {
                reconciliation.window_hits += candidates.len();
                if let Some(best) = nearest(&candidates) {
                    debug!(
                        "{} matched {} (max distance {})",
                        truth_key,
                        prediction_key(best.pair_index),
                        best.distances.max
                    );
                }
                let predictions = candidates
                    .iter()
                    .map(|c| {
                        consumed[c.pair_index] = true;
                        MatchedPrediction {
                            key: prediction_key(c.pair_index),
                            distances: Some(c.distances),
                        }
                    })
                    .collect();
                records.push(MatchRecord {
                    match_type: MatchType::InexactMatched,
                    truth: Some(truth_key),
                    predictions,
                    closest: None,
                });
            }
            PairMatch::NoOverlap => {
                let closest = closest_pair(&query, &indexes).map(|c| ClosestPrediction {
                    key: prediction_key(c.pair_index),
                    distances: c.distances,
                });
                records.push(MatchRecord {
                    closest,
                    ..MatchRecord::truth_only(MatchType::InexactUnmatched, truth_key)
                });
            }
            PairMatch::ChromosomeAbsent => {
                records.push(MatchRecord::truth_only(MatchType::InexactUnmatched, truth_key));
            }
        }
    }

    records.extend(
        prediction_only
            .into_iter()
            .zip(consumed)
            .filter(|(_, consumed)| !consumed)
            .map(|(key, _)| MatchRecord::prediction_only(MatchType::InexactUnmatched, key)),
    );

    if reconciliation.window_hits == 0 {
        warn!("No breakpoints found even with window extension!");
    } else {
        info!(
            "Window of {} bp recovered {} candidate breakpoint pairs",
            config.window, reconciliation.window_hits
        );
    }

    reconciliation.records = records;
    Ok(reconciliation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(window: u32) -> ComparisonConfig {
        ComparisonConfig::default().with_window(window)
    }

    #[test]
    fn test_identical_sets_exact_match() {
        let result = reconcile(&["chr1:100--chr2:200"], &["chr1:100--chr2:200"], &config(0)).unwrap();
        assert_eq!(result.records.len(), 1);
        let record = &result.records[0];
        assert_eq!(record.match_type, MatchType::ExactMatched);
        assert_eq!(record.distances(), Some(Distances::default()));
        assert_eq!(result.metrics().true_positives, 1);
        assert_eq!(result.metrics().false_positives, 0);
    }

    #[test]
    fn test_no_predictions() {
        let empty: [&str; 0] = [];
        let result = reconcile(&["chr1:100--chr2:200"], &empty, &config(0)).unwrap();
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].match_type, MatchType::ExactUnmatched);
        assert_eq!(result.records[0].truth.as_deref(), Some("chr1:100--chr2:200"));
        assert_eq!(result.metrics().sensitivity, Some(0.0));
    }

    #[test]
    fn test_disjoint_sets_without_window() {
        let truth = ["chr1:100--chr2:200", "chr3:1--chr4:2"];
        let preds = ["chr1:101--chr2:200", "chr5:1--chr6:2"];
        let result = reconcile(&truth, &preds, &config(0)).unwrap();
        assert_eq!(result.records.len(), 4);
        assert!(result
            .records
            .iter()
            .all(|r| r.match_type == MatchType::ExactUnmatched));
        assert_eq!(result.metrics().true_positives, 0);
    }

    #[test]
    fn test_window_recovers_nearby_pair() {
        let truth = ["chr1:100--chr2:200"];
        let preds = ["chr1:105--chr2:203"];

        let exact = reconcile(&truth, &preds, &config(0)).unwrap();
        assert_eq!(exact.count(MatchType::ExactUnmatched), 2);

        let windowed = reconcile(&truth, &preds, &config(10)).unwrap();
        assert_eq!(windowed.records.len(), 1);
        let record = &windowed.records[0];
        assert_eq!(record.match_type, MatchType::InexactMatched);
        assert_eq!(record.distances().unwrap().max, 5);
        assert_eq!(record.joined_predictions(), "chr1:105--chr2:203");
        assert_eq!(windowed.window_hits, 1);
    }

    #[test]
    fn test_reversed_sides_are_exact_under_lexsort() {
        let result = reconcile(&["chr2:200--chr1:100"], &["chr1:100--chr2:200"], &config(0)).unwrap();
        assert_eq!(result.records[0].match_type, MatchType::ExactMatched);

        let unsorted = ComparisonConfig {
            sorted: false,
            ..config(0)
        };
        let result = reconcile(&["chr2:200--chr1:100"], &["chr1:100--chr2:200"], &unsorted).unwrap();
        assert_eq!(result.count(MatchType::ExactUnmatched), 2);
    }

    #[test]
    fn test_absent_chromosome_is_unmatched() {
        let result = reconcile(&["chr1:100--chr2:200"], &["chr3:100--chr4:200"], &config(10)).unwrap();
        assert_eq!(result.count(MatchType::InexactUnmatched), 2);
        let truth = result.truth_records().next().unwrap();
        assert!(truth.closest.is_none());
    }

    #[test]
    fn test_unmatched_truth_reports_closest_prediction() {
        let result = reconcile(&["chr1:100--chr2:200"], &["chr1:160--chr2:230"], &config(10)).unwrap();
        let truth = result.truth_records().next().unwrap();
        assert_eq!(truth.match_type, MatchType::InexactUnmatched);
        let closest = truth.closest.as_ref().unwrap();
        assert_eq!(closest.key, "chr1:160--chr2:230");
        assert_eq!(closest.distances, Distances::new(60, 30));
    }

    #[test]
    fn test_consumed_predictions_not_reported_unmatched() {
        let truth = ["chr1:100--chr2:200"];
        let preds = ["chr1:102--chr2:200", "chr1:99--chr2:201", "chr7:5--chr8:5"];
        let result = reconcile(&truth, &preds, &config(10)).unwrap();

        let matched: Vec<_> = result
            .records
            .iter()
            .filter(|r| r.match_type == MatchType::InexactMatched)
            .collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(
            matched[0].joined_predictions(),
            "chr1:102--chr2:200;chr1:99--chr2:201"
        );
        assert_eq!(matched[0].distances().unwrap().max, 1);

        let leftover: Vec<_> = result.records.iter().filter(|r| r.truth.is_none()).collect();
        assert_eq!(leftover.len(), 1);
        assert_eq!(leftover[0].joined_predictions(), "chr7:5--chr8:5");

        let metrics = result.metrics();
        assert_eq!(metrics.true_positives, 1);
        assert_eq!(metrics.false_positives, 1);
        assert_eq!(metrics.sensitivity, Some(1.0));
        assert!((metrics.precision.unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_truth_after_lexsort_is_fatal() {
        let truth = ["chr1:100--chr2:200", "chr2:200--chr1:100"];
        let err = reconcile(&truth, &["chr1:100--chr2:200"], &config(0)).unwrap_err();
        assert!(matches!(err, BenchError::DuplicateTruthBreakpoint { .. }));

        // repeated identical rows are fine
        let truth = ["chr1:100--chr2:200", "chr1:100--chr2:200"];
        let result = reconcile(&truth, &["chr1:100--chr2:200"], &config(0)).unwrap();
        assert_eq!(result.truth_total, 1);
    }

    #[test]
    fn test_malformed_keys_still_classified() {
        let result = reconcile(&["weird"], &["chr1:1--chr2:2", "also-weird"], &config(10)).unwrap();
        assert_eq!(result.records.len(), 3);
        assert_eq!(result.count(MatchType::InexactUnmatched), 3);
    }

    #[test]
    fn test_reconcile_is_deterministic() {
        let truth = ["chr1:100--chr2:200", "chr3:50--chr1:70", "chr5:5--chr6:6"];
        let preds = ["chr1:104--chr2:196", "chr1:72--chr3:50", "chr1:100--chr2:201"];
        let first = reconcile(&truth, &preds, &config(10)).unwrap();
        let second = reconcile(&truth, &preds, &config(10)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_shared_prediction_matches_every_claiming_truth() {
        let truth = ["chr1:100--chr2:200", "chr1:106--chr2:200"];
        let preds = ["chr1:104--chr2:200"];
        let result = reconcile(&truth, &preds, &config(10)).unwrap();

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.count(MatchType::InexactMatched), 2);
        assert_eq!(result.records[0].truth.as_deref(), Some("chr1:100--chr2:200"));
        assert_eq!(result.records[0].distances().unwrap().max, 4);
        assert_eq!(result.records[1].truth.as_deref(), Some("chr1:106--chr2:200"));
        assert_eq!(result.records[1].distances().unwrap().max, 2);
        assert!(result.records.iter().all(|r| r.joined_predictions() == "chr1:104--chr2:200"));

        // classification still pairs the prediction with one truth key, the nearest
        let matches = result.prediction_matches();
        assert_eq!(matches.get("chr1:104--chr2:200"), Some(&("chr1:106--chr2:200", 2)));

        let metrics = result.metrics();
        assert_eq!(metrics.true_positives, 2);
        assert_eq!(metrics.false_positives, 0);
    }

    #[test]
    fn test_tied_shared_prediction_classified_with_lowest_truth_key() {
        let truth = ["chr1:100--chr2:200", "chr1:110--chr2:200"];
        let preds = ["chr1:105--chr2:200"];
        let result = reconcile(&truth, &preds, &config(10)).unwrap();
        assert_eq!(result.count(MatchType::InexactMatched), 2);
        let matches = result.prediction_matches();
        assert_eq!(matches.get("chr1:105--chr2:200"), Some(&("chr1:100--chr2:200", 5)));
    }
}
