//! Normalized truth and prediction tables (TSV), plus writers for result tables
//!
//! Inputs may be plain, gzip or BGZF compressed.

use crate::classify::ClassifiedRow;
use crate::config::ComparisonConfig;
use crate::error::{BenchError, Result};
use crate::paralog::NameRecord;
use crate::reconcile::MatchRecord;
use flate2::read::MultiGzDecoder;
use log::{debug, info};
use noodles::bgzf;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// One gold-standard fusion
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TruthRecord {
    pub fusion_name: String,
    pub breakpoint: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub num_reads: Option<f64>,
}

/// One normalized call from a fusion caller
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredictionRecord {
    #[serde(rename = "fusion")]
    pub fusion_name: String,
    pub breakpoint: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub num_reads: Option<f64>,
    pub prog: String,
    pub sample: String,
}

pub const TRUTH_COLUMNS: &[&str] = &["fusion_name", "breakpoint", "num_reads"];
pub const PREDICTION_COLUMNS: &[&str] = &["fusion", "breakpoint", "num_reads", "prog", "sample"];

const MISSING: &str = "NA";

const BGZF_HEADER_SIZE: usize = 18;

/// Check whether a file starts with a BGZF block header.
/// Returns `Ok(false)` for regular gzip, too-small files, or plain text.
fn is_bgzf<R: Read + Seek>(reader: &mut R) -> std::io::Result<bool> {
    let mut header = [0u8; BGZF_HEADER_SIZE];
    let result = match reader.read_exact(&mut header) {
        Ok(()) => Ok(header[0..2] == [0x1f, 0x8b]
            && header[3] == 0x04 // FEXTRA
            && header[12..14] == [b'B', b'C']),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    };
    reader.seek(SeekFrom::Start(0))?;
    result
}

/// Open a table, decompressing it if it ends in `.gz` or `.bgz`.
/// BGZF files go through the bgzf reader, regular gzip through flate2.
pub fn open_reader(path: &Path) -> Result<Box<dyn Read>> {
    let mut file = File::open(path)?;
    let is_compressed = [".gz", ".bgz"]
        .iter()
        .any(|extension| path.to_string_lossy().ends_with(extension));
    if !is_compressed {
        return Ok(Box::new(BufReader::new(file)));
    }

    if is_bgzf(&mut file)? {
        debug!("Reading {} as BGZF", path.display());
        Ok(Box::new(bgzf::io::Reader::new(file)))
    } else {
        Ok(Box::new(MultiGzDecoder::new(BufReader::new(file))))
    }
}

/// Deserialize a headed TSV after checking that every required column is present
fn read_table<T: DeserializeOwned, R: Read>(reader: R, label: &str, required: &[&str]) -> Result<Vec<T>> {
    let csv_error = |source| BenchError::Csv {
        path: label.to_string(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .from_reader(reader);

    let headers = reader.headers().map_err(csv_error)?.clone();
    if let Some(column) = required.iter().find(|c| !headers.iter().any(|h| h == **c)) {
        return Err(BenchError::MissingColumn {
            path: label.to_string(),
            column: column.to_string(),
        });
    }

    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(csv_error)
}

pub fn parse_truth<R: Read>(reader: R, label: &str) -> Result<Vec<TruthRecord>> {
    let records: Vec<TruthRecord> = read_table(reader, label, TRUTH_COLUMNS)?;
    debug!("Read {} truth fusions from {}", records.len(), label);
    Ok(records)
}

/// Parse predictions, keeping only rows whose read support passes the configured thresholds
pub fn parse_predictions<R: Read>(
    reader: R,
    label: &str,
    config: &ComparisonConfig,
) -> Result<Vec<PredictionRecord>> {
    let records: Vec<PredictionRecord> = read_table(reader, label, PREDICTION_COLUMNS)?;
    let total = records.len();
    let kept: Vec<PredictionRecord> = records
        .into_iter()
        .filter(|r| r.num_reads.is_some_and(|n| config.passes_support(n)))
        .collect();
    info!(
        "Kept {} of {} predictions from {} after read-support filtering",
        kept.len(),
        total,
        label
    );
    Ok(kept)
}

pub fn read_truth<P: AsRef<Path>>(path: P) -> Result<Vec<TruthRecord>> {
    let path = path.as_ref();
    parse_truth(open_reader(path)?, &path.display().to_string())
}

pub fn read_predictions<P: AsRef<Path>>(path: P, config: &ComparisonConfig) -> Result<Vec<PredictionRecord>> {
    let path = path.as_ref();
    parse_predictions(open_reader(path)?, &path.display().to_string(), config)
}

#[derive(Deserialize)]
struct BreakpointRow {
    breakpoint: String,
}

/// The `breakpoint` column of any truth or prediction table
pub fn read_breakpoints<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let rows: Vec<BreakpointRow> = read_table(open_reader(path)?, &path.display().to_string(), &["breakpoint"])?;
    Ok(rows.into_iter().map(|row| row.breakpoint).collect())
}

pub(crate) fn tsv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer)
}

fn or_missing<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

fn format_reads(value: Option<f64>) -> String {
    // whole read counts print without a fractional part
    value.map_or_else(|| MISSING.to_string(), |v| format!("{}", v))
}

fn write_rows<W: Write>(writer: W, header: &[&str], rows: impl Iterator<Item = Vec<String>>) -> Result<()> {
    let mut writer = tsv_writer(writer);
    let io_error = |e: csv::Error| BenchError::Io(e.into());
    writer.write_record(header).map_err(io_error)?;
    for row in rows {
        writer.write_record(&row).map_err(io_error)?;
    }
    writer.flush()?;
    Ok(())
}

/// Per-tool TP/FP/FN table; `windowed` adds the distance columns
pub fn write_classified<W: Write>(writer: W, rows: &[ClassifiedRow], windowed: bool) -> Result<()> {
    let mut header = vec![
        "prog",
        "sample",
        "lexsort_breakpoint",
        "truth_fusion_name",
        "truth_breakpoint",
        "truth_num_reads",
        "fusion",
        "breakpoint",
        "num_reads",
        "pred_class",
    ];
    if windowed {
        header.extend(["max_distance", "matched_breakpoint"]);
    }

    write_rows(
        writer,
        &header,
        rows.iter().map(|row| {
            let truth = row.truth.as_ref();
            let prediction = row.prediction.as_ref();
            let mut fields = vec![
                row.prog.clone(),
                or_missing(prediction.map(|p| p.sample.as_str())),
                row.key.clone(),
                or_missing(truth.map(|t| t.fusion_name.as_str())),
                or_missing(truth.map(|t| t.breakpoint.as_str())),
                format_reads(truth.and_then(|t| t.num_reads)),
                or_missing(prediction.map(|p| p.fusion_name.as_str())),
                or_missing(prediction.map(|p| p.breakpoint.as_str())),
                format_reads(prediction.and_then(|p| p.num_reads)),
                row.classification.to_string(),
            ];
            if windowed {
                fields.push(or_missing(row.max_distance));
                fields.push(or_missing(row.matched_breakpoint.as_deref()));
            }
            fields
        }),
    )
}

/// Breakpoint reconciliation records, one row per record
pub fn write_match_records<W: Write>(writer: W, records: &[MatchRecord]) -> Result<()> {
    let header = [
        "truth_brkpts",
        "pred_brkpts",
        "dist_left",
        "dist_right",
        "max_distance",
        "brkpt_match_type",
        "closest_pred_brkpt",
        "closest_max_distance",
    ];
    write_rows(
        writer,
        &header,
        records.iter().map(|record| {
            let distances = record.distances();
            let predictions = record.joined_predictions();
            vec![
                or_missing(record.truth.as_deref()),
                if predictions.is_empty() {
                    MISSING.to_string()
                } else {
                    predictions
                },
                or_missing(distances.map(|d| d.left)),
                or_missing(distances.map(|d| d.right)),
                or_missing(distances.map(|d| d.max)),
                record.match_type.to_string(),
                or_missing(record.closest.as_ref().map(|c| c.key.as_str())),
                or_missing(record.closest.as_ref().map(|c| c.distances.max)),
            ]
        }),
    )
}

/// Fusion-name reconciliation records
pub fn write_name_records<W: Write>(writer: W, records: &[NameRecord]) -> Result<()> {
    write_rows(
        writer,
        &["truth_fusion", "pred_fusions", "name_match_type"],
        records.iter().map(|record| {
            vec![
                or_missing(record.truth.as_deref()),
                if record.predictions.is_empty() {
                    MISSING.to_string()
                } else {
                    record.predictions.join(";")
                },
                record.match_type.to_string(),
            ]
        }),
    )
}
