//! CSV and Markdown report writers for crestmap.
//!
//! Writers consume the in-memory [`WordMap`](crestmap_analyze::WordMap)
//! and render it to files; they hold no scanning logic of their own.

mod csv;
mod markdown;

pub use csv::{write_raw_csv, write_raw_csv_file};
pub use markdown::{write_summary, write_summary_file, write_table, write_table_file};

use std::io;
use std::path::{Path, PathBuf};

use crestmap_analyze::WordMap;
use crestmap_core::reports;

/// Write all three reports into `out_dir`, creating it when missing.
/// Returns the paths written.
pub fn write_all(out_dir: &Path, map: &WordMap) -> io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)?;
    let csv = out_dir.join(reports::RAW_CSV_FILE);
    let table = out_dir.join(reports::TABLE_FILE);
    let summary = out_dir.join(reports::SUMMARY_FILE);
    write_raw_csv_file(&csv, &map.records)?;
    write_table_file(&table, map)?;
    write_summary_file(&summary, &map.summaries)?;
    Ok(vec![table, csv, summary])
}
