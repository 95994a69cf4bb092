use std::fmt;

/// Counts and rates for one truth-vs-prediction overlap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapMetrics {
    pub true_positives: usize,
    pub false_positives: usize,
    pub sensitivity: Option<f64>,
    pub precision: Option<f64>,
    pub f1: Option<f64>,
}

impl OverlapMetrics {
    /// `matched_truth` of `truth_total` truth items found, and `matched_predictions` of
    /// `prediction_total` predictions consumed by some truth item. One truth item may
    /// consume several predictions, so the two matched counts differ in general.
    /// Ratios with an empty denominator are undefined.
    pub fn new(
        matched_truth: usize,
        truth_total: usize,
        matched_predictions: usize,
        prediction_total: usize,
    ) -> Self {
        let ratio = |matched: usize, total: usize| (total > 0).then(|| matched as f64 / total as f64);
        let sensitivity = ratio(matched_truth, truth_total);
        let precision = ratio(matched_predictions, prediction_total);
        let f1 = match (sensitivity, precision) {
            (Some(s), Some(p)) if s + p > 0.0 => Some(2.0 * s * p / (s + p)),
            _ => None,
        };

        Self {
            true_positives: matched_truth,
            false_positives: prediction_total.saturating_sub(matched_predictions),
            sensitivity,
            precision,
            f1,
        }
    }
}

fn format_ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "NA".to_string(), |v| format!("{:.4}", v))
}

impl fmt::Display for OverlapMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TP={} FP={} sensitivity={} precision={} F1={}",
            self.true_positives,
            self.false_positives,
            format_ratio(self.sensitivity),
            format_ratio(self.precision),
            format_ratio(self.f1)
        )
    }
}
