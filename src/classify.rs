//! Per-tool TP/FP/FN classification of prediction rows against the truth table

use crate::config::ComparisonConfig;
use crate::error::{BenchError, Result};
use crate::reconcile::{reconcile, truth_keys};
use crate::table::{PredictionRecord, TruthRecord};
use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallClass {
    TruePositive,
    FalsePositive,
    FalseNegative,
}

impl CallClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallClass::TruePositive => "TP",
            CallClass::FalsePositive => "FP",
            CallClass::FalseNegative => "FN",
        }
    }
}

/// Class of one row. Only the first row of a `(tool, key)` group is primary;
/// the others are printed with an `NA_` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub class: CallClass,
    pub primary: bool,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.primary {
            f.write_str("NA_")?;
        }
        f.write_str(self.class.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRow {
    pub prog: String,
    /// Comparison key of the group the row belongs to
    pub key: String,
    pub truth: Option<TruthRecord>,
    pub prediction: Option<PredictionRecord>,
    /// Distance to the truth key for window-matched predictions
    pub max_distance: Option<u32>,
    /// Prediction key as written before joining onto a truth key
    pub matched_breakpoint: Option<String>,
    pub classification: Classification,
}

impl ClassifiedRow {
    /// Read support used to pick the primary row of a group. FN-only groups have
    /// no prediction, so they fall back to the truth support instead of all tying
    /// as missing; rows without any support still sort last.
    fn support(&self) -> Option<f64> {
        self.prediction
            .as_ref()
            .and_then(|p| p.num_reads)
            .or_else(|| self.truth.as_ref().and_then(|t| t.num_reads))
    }
}

struct JoinedPrediction<'a> {
    record: &'a PredictionRecord,
    max_distance: Option<u32>,
    matched_breakpoint: Option<String>,
}

#[derive(Default)]
struct Group<'a> {
    truth: Vec<&'a TruthRecord>,
    predictions: Vec<JoinedPrediction<'a>>,
}

fn by_support_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn check_single_sample(predictions: &[PredictionRecord]) -> Result<()> {
    let samples: BTreeSet<&str> = predictions.iter().map(|p| p.sample.as_str()).collect();
    if samples.len() > 1 {
        return Err(BenchError::MultipleSamples {
            count: samples.len(),
            labels: samples.into_iter().collect::<Vec<_>>().join(","),
        });
    }
    Ok(())
}

/// Prediction key -> (truth key, distance) for one tool's predictions
fn window_joins(
    truth_breakpoints: &[&str],
    predictions: &[&PredictionRecord],
    config: &ComparisonConfig,
) -> Result<FxHashMap<String, (String, u32)>> {
    if config.window == 0 {
        return Ok(FxHashMap::default());
    }
    let breakpoints: Vec<&str> = predictions.iter().map(|p| p.breakpoint.as_str()).collect();
    let reconciliation = reconcile(truth_breakpoints, &breakpoints, config)?;
    Ok(reconciliation
        .prediction_matches()
        .into_iter()
        .map(|(prediction, (truth, distance))| (prediction.to_string(), (truth.to_string(), distance)))
        .collect())
}

fn classify_group(prog: &str, key: String, group: Group) -> Vec<ClassifiedRow> {
    let row = |class, truth: Option<&TruthRecord>, joined: Option<&JoinedPrediction>| ClassifiedRow {
        prog: prog.to_string(),
        key: key.clone(),
        truth: truth.cloned(),
        prediction: joined.map(|j| j.record.clone()),
        max_distance: joined.and_then(|j| j.max_distance),
        matched_breakpoint: joined.and_then(|j| j.matched_breakpoint.clone()),
        classification: Classification {
            class,
            primary: false,
        },
    };
    let row = &row;

    let mut rows: Vec<ClassifiedRow> = match (group.truth.is_empty(), group.predictions.is_empty()) {
        (false, false) => group
            .truth
            .iter()
            .flat_map(|&t| {
                group
                    .predictions
                    .iter()
                    .map(move |p| row(CallClass::TruePositive, Some(t), Some(p)))
            })
            .collect(),
        (false, true) => group
            .truth
            .iter()
            .map(|t| row(CallClass::FalseNegative, Some(*t), None))
            .collect(),
        (true, false) => group
            .predictions
            .iter()
            .map(|p| row(CallClass::FalsePositive, None, Some(p)))
            .collect(),
        (true, true) => Vec::new(),
    };

    rows.sort_by(|a, b| by_support_desc(a.support(), b.support()));
    if let Some(first) = rows.first_mut() {
        first.classification.primary = true;
    }
    rows
}

/// Classify every prediction row and every (per-tool) truth row.
///
/// Rows come out sorted by tool, then comparison key, then read support
/// descending.
pub fn classify(
    truth: &[TruthRecord],
    predictions: &[PredictionRecord],
    config: &ComparisonConfig,
) -> Result<Vec<ClassifiedRow>> {
    check_single_sample(predictions)?;
    let truth_breakpoints: Vec<&str> = truth.iter().map(|t| t.breakpoint.as_str()).collect();
    truth_keys(&truth_breakpoints, config)?;

    let mut by_prog: BTreeMap<&str, Vec<&PredictionRecord>> = BTreeMap::new();
    for prediction in predictions {
        by_prog
            .entry(prediction.prog.as_str())
            .or_default()
            .push(prediction);
    }
    if by_prog.is_empty() {
        warn!("No predictions to classify; truth fusions are reported per tool only");
    }

    let mut rows = Vec::new();
    for (prog, prog_predictions) in by_prog {
        let joins = window_joins(&truth_breakpoints, &prog_predictions, config)?;

        let mut groups: BTreeMap<String, Group> = BTreeMap::new();
        for record in truth {
            groups
                .entry(config.breakpoint_key(&record.breakpoint))
                .or_default()
                .truth
                .push(record);
        }
        for record in prog_predictions {
            let key = config.breakpoint_key(&record.breakpoint);
            let (group_key, joined) = match joins.get(&key) {
                Some((truth_key, distance)) => (
                    truth_key.clone(),
                    JoinedPrediction {
                        record,
                        max_distance: Some(*distance),
                        matched_breakpoint: Some(key),
                    },
                ),
                None => (
                    key,
                    JoinedPrediction {
                        record,
                        max_distance: None,
                        matched_breakpoint: None,
                    },
                ),
            };
            groups.entry(group_key).or_default().predictions.push(joined);
        }

        let before = rows.len();
        for (key, group) in groups {
            rows.extend(classify_group(prog, key, group));
        }
        debug!("Classified {} rows for {}", rows.len() - before, prog);
    }

    let count = |class| {
        rows.iter()
            .filter(|r| r.classification.primary && r.classification.class == class)
            .count()
    };
    info!(
        "Classification: {} TP, {} FP, {} FN",
        count(CallClass::TruePositive),
        count(CallClass::FalsePositive),
        count(CallClass::FalseNegative)
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truth(breakpoint: &str, reads: f64) -> TruthRecord {
        TruthRecord {
            fusion_name: "A--B".to_string(),
            breakpoint: breakpoint.to_string(),
            num_reads: Some(reads),
        }
    }

    fn prediction(prog: &str, breakpoint: &str, reads: f64) -> PredictionRecord {
        PredictionRecord {
            fusion_name: "A--B".to_string(),
            breakpoint: breakpoint.to_string(),
            num_reads: Some(reads),
            prog: prog.to_string(),
            sample: "sim".to_string(),
        }
    }

    fn labels(rows: &[ClassifiedRow]) -> Vec<String> {
        rows.iter().map(|r| r.classification.to_string()).collect()
    }

    #[test]
    fn test_exact_true_positive() {
        let rows = classify(
            &[truth("chr1:100--chr2:200", 10.0)],
            &[prediction("ctat", "chr1:100--chr2:200", 4.0)],
            &ComparisonConfig::default(),
        )
        .unwrap();
        assert_eq!(labels(&rows), vec!["TP"]);
    }

    #[test]
    fn test_missed_truth_and_spurious_call() {
        let rows = classify(
            &[truth("chr1:100--chr2:200", 10.0)],
            &[prediction("ctat", "chr3:5--chr4:6", 2.0)],
            &ComparisonConfig::default(),
        )
        .unwrap();
        assert_eq!(labels(&rows), vec!["FN", "FP"]);
        assert_eq!(rows[0].key, "chr1:100--chr2:200");
        assert!(rows[0].prediction.is_none());
        assert!(rows[1].truth.is_none());
    }

    #[test]
    fn test_duplicate_truth_rows_tagged_secondary() {
        let truth_rows = [truth("chr1:100--chr2:200", 10.0), truth("chr1:100--chr2:200", 3.0)];

        let rows = classify(
            &truth_rows,
            &[prediction("ctat", "chr1:100--chr2:200", 4.0)],
            &ComparisonConfig::default(),
        )
        .unwrap();
        assert_eq!(labels(&rows), vec!["TP", "NA_TP"]);

        let rows = classify(
            &truth_rows,
            &[prediction("ctat", "chr9:1--chr9:2", 4.0)],
            &ComparisonConfig::default(),
        )
        .unwrap();
        assert_eq!(labels(&rows), vec!["FN", "NA_FN", "FP"]);
        // higher truth support first
        assert_eq!(rows[0].truth.as_ref().unwrap().num_reads, Some(10.0));
    }

    #[test]
    fn test_missed_truth_primary_by_truth_support() {
        let rows = classify(
            &[truth("chr1:100--chr2:200", 3.0), truth("chr1:100--chr2:200", 10.0)],
            &[prediction("ctat", "chr9:1--chr9:2", 4.0)],
            &ComparisonConfig::default(),
        )
        .unwrap();
        assert_eq!(labels(&rows), vec!["FN", "NA_FN", "FP"]);
        assert_eq!(rows[0].truth.as_ref().unwrap().num_reads, Some(10.0));
        assert_eq!(rows[1].truth.as_ref().unwrap().num_reads, Some(3.0));
    }

    #[test]
    fn test_secondary_ordering_by_support() {
        let rows = classify(
            &[truth("chr1:100--chr2:200", 10.0)],
            &[
                prediction("ctat", "chr2:200--chr1:100", 2.0),
                prediction("ctat", "chr1:100--chr2:200", 7.0),
            ],
            &ComparisonConfig::default(),
        )
        .unwrap();
        assert_eq!(labels(&rows), vec!["TP", "NA_TP"]);
        assert_eq!(rows[0].prediction.as_ref().unwrap().num_reads, Some(7.0));
    }

    #[test]
    fn test_truth_replicated_per_tool() {
        let rows = classify(
            &[truth("chr1:100--chr2:200", 10.0)],
            &[
                prediction("arriba", "chr1:100--chr2:200", 4.0),
                prediction("ctat", "chr1:100--chr2:200", 4.0),
            ],
            &ComparisonConfig::default(),
        )
        .unwrap();
        assert_eq!(labels(&rows), vec!["TP", "TP"]);
        assert_eq!(rows[0].prog, "arriba");
        assert_eq!(rows[1].prog, "ctat");
    }

    #[test]
    fn test_multiple_samples_rejected() {
        let mut other = prediction("ctat", "chr1:1--chr2:2", 3.0);
        other.sample = "other".to_string();
        let err = classify(
            &[],
            &[prediction("ctat", "chr1:1--chr2:2", 3.0), other],
            &ComparisonConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BenchError::MultipleSamples { count: 2, .. }));
    }

    #[test]
    fn test_window_join() {
        let truth_rows = [truth("chr1:100--chr2:200", 10.0)];
        let predictions = [prediction("ctat", "chr1:105--chr2:203", 4.0)];

        let rows = classify(&truth_rows, &predictions, &ComparisonConfig::default()).unwrap();
        assert_eq!(labels(&rows), vec!["FN", "FP"]);

        let config = ComparisonConfig::default().with_window(10);
        let rows = classify(&truth_rows, &predictions, &config).unwrap();
        assert_eq!(labels(&rows), vec!["TP"]);
        assert_eq!(rows[0].key, "chr1:100--chr2:200");
        assert_eq!(rows[0].max_distance, Some(5));
        assert_eq!(rows[0].matched_breakpoint.as_deref(), Some("chr1:105--chr2:203"));
    }
}
