//! CSV import and export
//!
//! Input files need a header row; columns are matched by name so their order
//! does not matter and unknown columns are ignored. Rows whose first cell starts
//! with `#` are commented out. Empty cells read as absent values.
//!
//! Group definition files are read without quote handling so that `appliesTo`
//! expressions can contain double quotes.

use std::collections::HashMap;
use std::io::{Read, Write};

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::models::{ExportRecord, GroupDefinition, ImportRecord};
use crate::utils::validation::is_comment_cell;
use crate::utils::{AppError, AppResult};

/// Header columns of an export file, in order
pub const EXPORT_COLUMNS: [&str; 6] = [
    "collector_id",
    "hostname",
    "display_name",
    "group_list",
    "description",
    "properties",
];

/// Column name to position lookup built from a header row
struct HeaderIndex {
    columns: HashMap<String, usize>,
}

impl HeaderIndex {
    fn new(headers: &StringRecord, required: &[&str]) -> AppResult<Self> {
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(AppError::Validation("CSV file has no header row".to_string()));
        }

        let columns: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().trim_start_matches('\u{feff}').to_string(), i))
            .collect();

        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|c| !columns.contains_key(*c))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "CSV header is missing required column(s): {}",
                missing.join(", ")
            )));
        }

        Ok(Self { columns })
    }

    /// Trimmed cell value, `None` when the column or the value is absent
    fn get(&self, record: &StringRecord, column: &str) -> Option<String> {
        let value = record.get(*self.columns.get(column)?)?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }
}

fn is_commented(record: &StringRecord) -> bool {
    record.get(0).map(is_comment_cell).unwrap_or(false)
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or_default()
}

/// Read host import rows
pub fn read_import_records<R: Read>(reader: R) -> AppResult<Vec<ImportRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let index = HeaderIndex::new(rdr.headers()?, &["hostname", "collector_id"])?;

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        if is_commented(&row) {
            debug!(line = line_of(&row), "Skipping commented row");
            continue;
        }
        records.push(ImportRecord {
            line: line_of(&row),
            hostname: index.get(&row, "hostname"),
            collector_id: index.get(&row, "collector_id"),
            display_name: index.get(&row, "display_name"),
            description: index.get(&row, "description"),
            properties: index.get(&row, "properties"),
            group_list: index.get(&row, "group_list"),
            link: index.get(&row, "link"),
        });
    }

    Ok(records)
}

/// Read group definition rows
pub fn read_group_definitions<R: Read>(reader: R) -> AppResult<Vec<GroupDefinition>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);
    let index = HeaderIndex::new(rdr.headers()?, &["groupname", "grouppath"])?;

    let mut definitions = Vec::new();
    for row in rdr.records() {
        let row = row?;
        if is_commented(&row) {
            continue;
        }
        definitions.push(GroupDefinition {
            line: line_of(&row),
            name: index.get(&row, "groupname"),
            parent_path: index.get(&row, "grouppath"),
            applies_to: index.get(&row, "appliesTo"),
            description: index.get(&row, "description"),
            properties: index.get(&row, "properties"),
        });
    }

    Ok(definitions)
}

/// Write host export rows with a header
pub fn write_export_records<W: Write>(records: &[ExportRecord], writer: W) -> AppResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    if records.is_empty() {
        wtr.write_record(EXPORT_COLUMNS)?;
    }
    for record in records {
        wtr.serialize(record)?;
    }

    wtr.flush()?;
    Ok(())
}
