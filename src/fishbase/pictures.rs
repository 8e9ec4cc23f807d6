use crate::error::Result;
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use urlencoding::encode;

pub const BASE_PICTURE_URL: &str = "https://www.fishbase.se/images/species/";

/// A row of a FishBase picture export.
#[derive(Debug, Deserialize)]
struct PictureRow {
    #[serde(rename = "ScientificName")]
    scientific_name: String,
    #[serde(rename = "SpecCode", default)]
    spec_code: Option<String>,
    #[serde(rename = "PicName", default)]
    pic_name: Option<String>,
    #[serde(rename = "ImageURL", default)]
    image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Picture {
    pub scientific_name: String,
    pub spec_code: Option<String>,
    pub pic_name: String,
    pub url: String,
}

/// Pictures grouped by lowercased, trimmed scientific name.
#[derive(Debug, Default)]
pub struct PictureCatalog {
    by_name: HashMap<String, Vec<Picture>>,
}

impl PictureCatalog {
    pub fn from_pictures(pictures: impl IntoIterator<Item = Picture>) -> Self {
        let mut by_name: HashMap<String, Vec<Picture>> = HashMap::new();
        for picture in pictures {
            let entry = by_name.entry(name_key(&picture.scientific_name)).or_default();
            if !entry.contains(&picture) {
                entry.push(picture);
            }
        }
        Self { by_name }
    }

    /// Pictures for `scientific_name`, in manifest order.
    pub fn for_species(&self, scientific_name: &str) -> &[Picture] {
        self.by_name
            .get(&name_key(scientific_name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drops the pictures of every species for which `keep` is false.
    pub fn retain_species<F: FnMut(&str) -> bool>(&mut self, mut keep: F) {
        self.by_name.retain(|_, pictures| {
            pictures
                .first()
                .is_some_and(|p| keep(&p.scientific_name))
        });
    }

    pub fn species_count(&self) -> usize {
        self.by_name.len()
    }

    pub fn picture_count(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Reads a picture manifest. Rows without a picture name are dropped; rows
/// without an explicit URL point at `base_url`.
pub fn load_picture_manifest(path: &Path, base_url: &str) -> Result<PictureCatalog> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut pictures = Vec::new();

    for result in reader.deserialize() {
        let row: PictureRow = result?;
        let Some(pic_name) = row
            .pic_name
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
        else {
            debug!("Manifest row for {} has no picture", row.scientific_name);
            continue;
        };
        let url = row
            .image_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| picture_url(base_url, &pic_name));
        pictures.push(Picture {
            scientific_name: row.scientific_name,
            spec_code: row.spec_code.filter(|c| !c.is_empty()),
            pic_name,
            url,
        });
    }

    Ok(PictureCatalog::from_pictures(pictures))
}

pub fn picture_url(base_url: &str, pic_name: &str) -> String {
    format!("{}{}", base_url, encode(pic_name))
}

/// Keeps alphanumerics, spaces, `-` and `_`, trims the end and turns spaces
/// into underscores.
pub fn sanitize_filename(s: &str) -> String {
    let kept: String = s
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    kept.trim_end().replace(' ', "_")
}

/// Local file name for a picture: `{id}_{scientific name}_{picture stem}`
/// sanitized, keeping the picture's extension (`.jpg` when it has none).
pub fn picture_file_name(species_id: &str, scientific_name: &str, pic_name: &str) -> String {
    let pic = Path::new(pic_name);
    let stem = pic
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(pic_name);
    let ext = pic
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| sanitize_filename(e).to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "jpg".to_string());
    let base = sanitize_filename(&format!("{}_{}_{}", species_id, scientific_name, stem));
    format!("{}.{}", base, ext)
}
