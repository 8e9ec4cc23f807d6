//! Loading the species dataset from the formats it ships in.
pub mod js_module;

use crate::error::{CrateError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

pub use js_module::JsModuleLoader;

const ID_FIELDS: [&str; 3] = ["id", "SpecCode", "specCode"];
const SCIENTIFIC_NAME_FIELDS: [&str; 4] = ["scientificName", "scientific_name", "name", "scientific"];
const IMAGE_FIELDS: [&str; 3] = ["image", "imageUrl", "image_url"];

/// One species entry, kept as the ordered object it was loaded from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FishRecord(Map<String, Value>);

impl FishRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Non-empty string value of `key`.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// Species id, rendering numeric ids as text.
    pub fn id(&self) -> Option<String> {
        ID_FIELDS.iter().find_map(|key| match self.0.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn scientific_name(&self) -> Option<&str> {
        SCIENTIFIC_NAME_FIELDS.iter().find_map(|key| self.text(key))
    }

    pub fn common_name(&self) -> Option<&str> {
        self.text("name")
    }

    pub fn image(&self) -> Option<&str> {
        IMAGE_FIELDS.iter().find_map(|key| self.text(key))
    }

    pub fn description(&self) -> Option<&str> {
        self.text("description")
    }
}

impl From<Map<String, Value>> for FishRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Reads a sequence of records from one source format.
pub trait RecordLoader {
    fn load_records(&self, path: &Path) -> Result<Vec<FishRecord>>;
}

/// A plain JSON array of objects.
pub struct JsonLoader;

impl RecordLoader for JsonLoader {
    fn load_records(&self, path: &Path) -> Result<Vec<FishRecord>> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str::<Vec<FishRecord>>(&text).map_err(|e| CrateError::DatasetParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Delimited text with a header row; every cell becomes a string field.
pub struct DelimitedLoader {
    pub delimiter: u8,
}

impl RecordLoader for DelimitedLoader {
    fn load_records(&self, path: &Path) -> Result<Vec<FishRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .from_path(path)?;
        let headers = reader.headers()?.clone();

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let fields: Map<String, Value> = headers
                .iter()
                .zip(row.iter())
                .map(|(h, v)| (h.to_string(), Value::String(v.to_string())))
                .collect();
            records.push(FishRecord::new(fields));
        }
        Ok(records)
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatasetFormat {
    /// Pick by file extension.
    #[default]
    Auto,
    /// A JS module exporting `fishDatabase`.
    Js,
    /// A JSON array of objects.
    Json,
    /// Comma- or tab-separated text with a header row.
    Csv,
}

impl DatasetFormat {
    /// Replaces `Auto` with the format implied by the path's extension.
    pub fn detect(self, path: &Path) -> DatasetFormat {
        if self != DatasetFormat::Auto {
            return self;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("js") | Some("mjs") => DatasetFormat::Js,
            Some("csv") | Some("tsv") => DatasetFormat::Csv,
            _ => DatasetFormat::Json,
        }
    }
}

/// Loads the dataset at `path` with the loader for `format`.
pub fn load_records(path: &Path, format: DatasetFormat) -> Result<Vec<FishRecord>> {
    let loader: Box<dyn RecordLoader> = match format.detect(path) {
        DatasetFormat::Js => Box::new(JsModuleLoader),
        DatasetFormat::Csv => Box::new(DelimitedLoader {
            delimiter: delimiter_for(path),
        }),
        DatasetFormat::Json | DatasetFormat::Auto => Box::new(JsonLoader),
    };
    loader.load_records(path)
}

/// Tab for `.tsv` paths, comma otherwise.
pub fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}
