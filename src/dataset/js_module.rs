//! Recovers the species array from a JS module of the form
//! `export const fishDatabase = [ ... ];`.
use super::{FishRecord, RecordLoader};
use crate::error::{CrateError, Result};
use log::warn;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::path::Path;

pub const EXPORT_TOKEN: &str = "export const fishDatabase =";

// String literals are matched first so comment markers inside them survive.
static COMMENTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"("(?:[^"\\]|\\.)*")|//[^\n]*|/\*[\s\S]*?\*/"#).expect("valid comment regex")
});

static TRAILING_COMMAS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"("(?:[^"\\]|\\.)*")|,\s*([\]}])"#).expect("valid trailing comma regex")
});

static NAME_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""name"\s*:\s*"([^"]+)""#).expect("valid name regex"));

static ID_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""id"\s*:\s*"?([^",}]+)"?"#).expect("valid id regex"));

pub struct JsModuleLoader;

impl RecordLoader for JsModuleLoader {
    fn load_records(&self, path: &Path) -> Result<Vec<FishRecord>> {
        let text = std::fs::read_to_string(path)?;
        let array = extract_array(&text).ok_or_else(|| CrateError::DatasetExportNotFound {
            path: path.to_path_buf(),
        })?;
        let cleaned = strip_trailing_commas(&strip_comments(array));

        match serde_json::from_str::<Vec<FishRecord>>(&cleaned) {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!(
                    "Dataset {} is not valid JSON after cleanup ({}); salvaging id/name pairs",
                    path.display(),
                    e
                );
                let salvaged = salvage_records(array);
                if salvaged.is_empty() {
                    Err(CrateError::DatasetParse {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    })
                } else {
                    Ok(salvaged)
                }
            }
        }
    }
}

/// Slices out the array literal following the export token.
///
/// The array ends at the first `];`; without one the rest of the file is
/// taken. Returns `None` when the export token is absent.
pub fn extract_array(text: &str) -> Option<&str> {
    let start = text.find(EXPORT_TOKEN)? + EXPORT_TOKEN.len();
    let rest = &text[start..];
    let end = rest.find("];").map(|i| i + 1).unwrap_or(rest.len());
    let array = rest[..end].trim();
    match array.find('[') {
        Some(open) => Some(&array[open..]),
        None => Some(array),
    }
}

pub fn strip_comments(text: &str) -> String {
    COMMENTS
        .replace_all(text, |caps: &Captures| {
            caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default()
        })
        .into_owned()
}

pub fn strip_trailing_commas(text: &str) -> String {
    TRAILING_COMMAS
        .replace_all(text, |caps: &Captures| match caps.get(1) {
            Some(literal) => literal.as_str().to_string(),
            None => caps[2].to_string(),
        })
        .into_owned()
}

/// Last resort for arrays that still do not parse: pull `id`/`name` pairs out
/// of each `},{`-separated chunk. The id defaults to the name.
fn salvage_records(array: &str) -> Vec<FishRecord> {
    array
        .split("},{")
        .filter_map(|chunk| {
            let name = NAME_FIELD.captures(chunk)?.get(1)?.as_str().trim().to_string();
            let id = ID_FIELD
                .captures(chunk)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_else(|| name.clone());
            let mut fields = Map::new();
            fields.insert("id".to_string(), Value::String(id));
            fields.insert("name".to_string(), Value::String(name));
            Some(FishRecord::new(fields))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn js_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".js").tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn extracts_array_up_to_terminator() {
        let text = "// header\nexport const fishDatabase = [\n  {\"id\": 1}\n];\nexport default fishDatabase;\n";
        assert_eq!(extract_array(text), Some("[\n  {\"id\": 1}\n]"));
    }

    #[test]
    fn extract_without_terminator_takes_rest_of_file() {
        let text = "export const fishDatabase = [{\"id\": 1}]";
        assert_eq!(extract_array(text), Some("[{\"id\": 1}]"));
    }

    #[test]
    fn extract_requires_export_token() {
        assert_eq!(extract_array("const other = [];"), None);
    }

    #[test]
    fn comments_are_removed_but_urls_survive() {
        let text = "[{\"image\": \"https://example.org/a.jpg\"}, // trailing\n /* block\n comment */ {\"id\": 2}]";
        let stripped = strip_comments(text);
        assert!(stripped.contains("https://example.org/a.jpg"));
        assert!(!stripped.contains("trailing"));
        assert!(!stripped.contains("block"));
    }

    #[test]
    fn trailing_commas_are_removed() {
        let text = "[{\"a\": 1, \"b\": \"x, ]\",}, ]";
        assert_eq!(strip_trailing_commas(text), "[{\"a\": 1, \"b\": \"x, ]\"}]");
    }

    #[test]
    fn loads_module_with_comments_and_trailing_commas() {
        let file = js_file(
            "export const fishDatabase = [\n  // freshwater\n  {\n    \"id\": \"1\",\n    \"name\": \"Guppy\",\n    \"scientificName\": \"Poecilia reticulata\",\n  },\n  {\"id\": 2, \"name\": \"Goldfish\", \"scientificName\": \"Carassius auratus\"},\n];\n",
        );
        let records = JsModuleLoader.load_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].scientific_name(), Some("Poecilia reticulata"));
        assert_eq!(records[1].id().as_deref(), Some("2"));
    }

    #[test]
    fn missing_export_is_reported() {
        let file = js_file("const fish = [];\n");
        let result = JsModuleLoader.load_records(file.path());
        assert!(matches!(result, Err(CrateError::DatasetExportNotFound { .. })));
    }

    #[test]
    fn unparseable_array_falls_back_to_salvage() {
        let file = js_file(
            "export const fishDatabase = [{\"id\": 1, \"name\": \"Guppy\", size: 3},{\"name\": \"Molly\", temp: {min: 20}}];",
        );
        let records = JsModuleLoader.load_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id().as_deref(), Some("1"));
        assert_eq!(records[1].id().as_deref(), Some("Molly"));
    }

    #[test]
    fn unparseable_array_without_names_is_an_error() {
        let file = js_file("export const fishDatabase = [{size: 3}];");
        let result = JsModuleLoader.load_records(file.path());
        assert!(matches!(result, Err(CrateError::DatasetParse { .. })));
    }
}
