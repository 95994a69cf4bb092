use crate::breakpoint_index::build_indexes;
use crate::table::{read_breakpoints, tsv_writer};
use log::info;
use std::io::{self, Write};

/// Per-chromosome sizes of the left and right indexes built over a breakpoint table
pub fn run_stats<W: Write>(path: &str, window: u32, writer: W) -> io::Result<()> {
    let breakpoints = read_breakpoints(path)?;
    let indexes = build_indexes(&breakpoints, window);
    info!(
        "Indexed {} of {} breakpoint pairs with a {} bp window ({} skipped)",
        indexes.len(),
        breakpoints.len(),
        indexes.window(),
        indexes.skipped()
    );

    let mut writer = tsv_writer(writer);
    writer.write_record(["chrom", "left", "right"])?;
    for name in indexes.chroms.names_natural() {
        let Some(id) = indexes.chroms.get_id(name) else {
            continue;
        };
        writer.write_record([
            name.to_string(),
            indexes.left.chrom_len(id).to_string(),
            indexes.right.chrom_len(id).to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
