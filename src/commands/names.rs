use crate::config::ComparisonConfig;
use crate::paralog::{reconcile_names, ParalogClusters};
use crate::table::{read_predictions, read_truth, write_name_records};
use log::info;
use std::io::{self, Write};

/// Reconcile fusion names, optionally letting paralogs of either partner stand in
pub fn run_names<W: Write>(
    truth_path: &str,
    predictions_path: &str,
    paralogs_path: Option<&str>,
    config: &ComparisonConfig,
    writer: W,
) -> io::Result<()> {
    config.validate()?;
    let truth: Vec<String> = read_truth(truth_path)?
        .into_iter()
        .map(|r| r.fusion_name)
        .collect();
    let predictions: Vec<String> = read_predictions(predictions_path, config)?
        .into_iter()
        .map(|r| r.fusion_name)
        .collect();
    let clusters = paralogs_path.map(ParalogClusters::from_path).transpose()?;

    let reconciliation = reconcile_names(&truth, &predictions, clusters.as_ref(), config);
    info!("Fusion names: {}", reconciliation.metrics());

    write_name_records(writer, &reconciliation.records)?;
    Ok(())
}
