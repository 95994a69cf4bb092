use crate::config::ComparisonConfig;
use crate::reconcile::{reconcile, MatchType};
use crate::table::{read_predictions, read_truth, write_match_records};
use log::{info, warn};
use std::io::{self, Write};

/// Reconcile truth breakpoints with one tool's predicted breakpoints (all tools
/// pooled when `prog` is `None`) and write one row per match record.
pub fn run_compare<W: Write>(
    truth_path: &str,
    predictions_path: &str,
    prog: Option<&str>,
    config: &ComparisonConfig,
    writer: W,
) -> io::Result<()> {
    config.validate()?;
    let truth: Vec<String> = read_truth(truth_path)?
        .into_iter()
        .map(|r| r.breakpoint)
        .collect();
    let predictions: Vec<String> = read_predictions(predictions_path, config)?
        .into_iter()
        .filter(|r| prog.map_or(true, |prog| r.prog == prog))
        .map(|r| r.breakpoint)
        .collect();
    if predictions.is_empty() {
        warn!(
            "No predictions left to compare{}",
            prog.map(|p| format!(" for {}", p)).unwrap_or_default()
        );
    }

    let reconciliation = reconcile(&truth, &predictions, config)?;
    info!(
        "{} exact, {} window matched, {} exact unmatched, {} window unmatched",
        reconciliation.count(MatchType::ExactMatched),
        reconciliation.count(MatchType::InexactMatched),
        reconciliation.count(MatchType::ExactUnmatched),
        reconciliation.count(MatchType::InexactUnmatched)
    );
    info!("{}: {}", prog.unwrap_or("all"), reconciliation.metrics());

    write_match_records(writer, &reconciliation.records)?;
    Ok(())
}
