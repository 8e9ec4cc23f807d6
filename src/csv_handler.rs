use crate::dataset::FishRecord;
use crate::error::{CrateError, Result};
use crate::output::ensure_parent_dir;
use crate::taxon::normalize;
use csv::{StringRecord, WriterBuilder};
use log::debug;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;

const ID_COLUMNS: [&str; 3] = ["id", "species_id", "SpeciesID"];
const NAME_COLUMNS: [&str; 3] = ["scientificName", "scientific_name", "ScientificName"];
const NAME_LIST_COLUMNS: [&str; 3] = ["scientificName", "scientific_name", "name"];

/// A row of the scientific-names table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeciesRecord {
    pub id: Option<String>,
    pub scientific_name: String,
}

/// Scientific names keyed by their slug.
pub type NameTable = HashMap<String, SpeciesRecord>;

/// Loads the scientific-names CSV into a table keyed by slug.
///
/// A missing file is an empty table. Rows that fail to parse, have no
/// scientific name, or slug to nothing are skipped. When two names share a
/// slug the later row wins.
pub fn load_name_table(path: &Path) -> Result<NameTable> {
    let mut table = NameTable::new();
    if !path.exists() {
        debug!("Names table {:?} not found; continuing without it", path);
        return Ok(table);
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let id_columns = column_positions(&headers, &ID_COLUMNS);
    let name_columns = column_positions(&headers, &NAME_COLUMNS);

    for (i, result) in reader.records().enumerate() {
        let row_num = i + 2;
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                debug!("Skipping unreadable names row {}: {}", row_num, e);
                continue;
            }
        };

        let Some(name) = first_non_empty(&row, &name_columns) else {
            continue;
        };
        let slug = normalize(name);
        if slug.is_empty() {
            debug!("Skipping names row {}: {:?} has no slug", row_num, name);
            continue;
        }

        table.insert(
            slug,
            SpeciesRecord {
                id: first_non_empty(&row, &id_columns).map(str::to_string),
                scientific_name: name.to_string(),
            },
        );
    }

    Ok(table)
}

/// Loads a list of species names as a set of slugs.
///
/// The names are read from the first present column among
/// `scientificName`, `scientific_name` and `name`, falling back to the
/// first column. Empty cells are ignored. Unlike the names table, a missing
/// file is an error.
pub fn load_name_list(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Err(CrateError::MissingInput(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let column = NAME_LIST_COLUMNS
        .iter()
        .find_map(|name| headers.iter().position(|h| h == *name))
        .unwrap_or(0);

    let mut slugs = HashSet::new();
    for result in reader.records() {
        let Ok(row) = result else {
            continue;
        };
        let Some(name) = row.get(column).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let slug = normalize(name);
        if !slug.is_empty() {
            slugs.insert(slug);
        }
    }
    Ok(slugs)
}

fn column_positions(headers: &StringRecord, names: &[&str]) -> Vec<usize> {
    names
        .iter()
        .filter_map(|name| headers.iter().position(|h| h == *name))
        .collect()
}

fn first_non_empty<'r>(row: &'r StringRecord, positions: &[usize]) -> Option<&'r str> {
    positions
        .iter()
        .filter_map(|&pos| row.get(pos))
        .find(|value| !value.is_empty())
}

/// Writes the `id,scientificName` export and returns the row count.
pub fn write_scientific_names(records: &[FishRecord], path: &Path) -> Result<usize> {
    ensure_parent_dir(path)?;
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(["id", "scientificName"])?;

    for record in records {
        let id = record.id().unwrap_or_default();
        let name = record.scientific_name().unwrap_or("");
        writer.write_record([id.as_str(), name])?;
    }

    writer.flush()?;
    Ok(records.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnarSummary {
    pub rows: usize,
    pub columns: usize,
}

/// Flattens records into delimited text, one column per field name.
///
/// Columns appear in first-seen order across all records. Nested values are
/// written as compact JSON; absent and `null` values are empty cells.
pub fn write_columnar(records: &[FishRecord], path: &Path, delimiter: u8) -> Result<ColumnarSummary> {
    let mut columns: Vec<&str> = Vec::new();
    for record in records {
        for key in record.fields().keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key.as_str());
            }
        }
    }

    ensure_parent_dir(path)?;
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    writer.write_record(&columns)?;

    for record in records {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| cell_text(record.get(column)))
            .collect();
        writer.write_record(&cells)?;
    }

    writer.flush()?;
    Ok(ColumnarSummary {
        rows: records.len(),
        columns: columns.len(),
    })
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
