//! Data-dictionary ingestion for metagraph (boundary adapter).
//!
//! Reads the two raw input shapes the graph builder understands:
//! - literal table definitions: a JSON array of `{table_name, columns: [{name, type}]}`
//! - data-dictionary exports: CSV files with `key`, `description`,
//!   `al_datadict_item_properties` and `al_datadict_item_column_data_type`
//!
//! Nothing here interprets the rows; grouping, normalization and inference
//! happen in `metagraph-core`.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use metagraph_core::{DictionaryRow, RawTableDefinition};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const DICTIONARY_EXTENSION: &str = "csv";

/// Parse literal table definitions from JSON text.
pub fn parse_definitions(text: &str) -> Result<Vec<RawTableDefinition>> {
    serde_json::from_str(text).context("invalid table definitions JSON")
}

pub fn read_definitions(path: &Path) -> Result<Vec<RawTableDefinition>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read definitions {}", path.display()))?;
    parse_definitions(&text).with_context(|| format!("in {}", path.display()))
}

/// Decode dictionary rows from CSV. Records that do not decode are skipped.
pub fn parse_dictionary_csv<R: Read>(input: R, locator: &str) -> Result<Vec<DictionaryRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(input);

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<DictionaryRow>().enumerate() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) => warn!(source = %locator, record = index + 1, error = %e, "skipping undecodable dictionary row"),
        }
    }
    debug!(source = %locator, rows = rows.len(), "dictionary decoded");
    Ok(rows)
}

pub fn read_dictionary_csv(path: &Path) -> Result<Vec<DictionaryRow>> {
    let file = fs::File::open(path)
        .with_context(|| format!("failed to open dictionary {}", path.display()))?;
    parse_dictionary_csv(file, &path.display().to_string())
}

/// Every `.csv` file under `dir`, recursively, in sorted order.
pub fn discover_dictionary_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("failed to scan {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_dictionary = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(DICTIONARY_EXTENSION));
        if is_dictionary {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Rows of every dictionary under `dir`, concatenated in file order.
pub fn load_dictionaries(dir: &Path) -> Result<Vec<DictionaryRow>> {
    let mut rows = Vec::new();
    for path in discover_dictionary_files(dir)? {
        rows.extend(read_dictionary_csv(&path)?);
    }
    Ok(rows)
}
