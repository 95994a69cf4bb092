use crate::classify::classify;
use crate::config::ComparisonConfig;
use crate::table::{read_predictions, read_truth, write_classified};
use log::info;
use std::io::{self, Write};

/// Write the per-tool TP/FP/FN table for one sample's predictions
pub fn run_classify<W: Write>(
    truth_path: &str,
    predictions_path: &str,
    config: &ComparisonConfig,
    writer: W,
) -> io::Result<()> {
    config.validate()?;
    let truth = read_truth(truth_path)?;
    let predictions = read_predictions(predictions_path, config)?;
    info!(
        "Classifying {} predictions against {} truth fusions (window {})",
        predictions.len(),
        truth.len(),
        config.window
    );

    let rows = classify(&truth, &predictions, config)?;
    write_classified(writer, &rows, config.window > 0)?;
    Ok(())
}
