//! Grouping image files by species slug.
use crate::csv_handler::NameTable;
use crate::error::{CrateError, Result};
use crate::taxon::resolve;
use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::Path;

pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "svg"];

/// Image files resolved to one slug, plus the species they belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageGroup {
    pub files: Vec<String>,
    pub species_id: Option<String>,
    pub scientific_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageIndex {
    pub generated_from: String,
    pub file_count: usize,
    pub species_count: usize,
    pub matched_to_names_csv: usize,
    pub images: IndexMap<String, ImageGroup>,
}

impl ImageIndex {
    /// Records the directory the listing came from.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.generated_from = source.into();
        self
    }
}

/// Splits `file_name` into its stem and lowercased extension when the
/// extension is a recognized image type.
pub fn image_stem(file_name: &str) -> Option<&str> {
    let (stem, ext) = split_extension(file_name)?;
    let ext = ext.to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(stem)
}

// A leading dot marks a hidden file, not an extension.
fn split_extension(file_name: &str) -> Option<(&str, &str)> {
    let dot = file_name.rfind('.')?;
    let stem = &file_name[..dot];
    if stem.trim_start_matches('.').is_empty() {
        return None;
    }
    Some((stem, &file_name[dot + 1..]))
}

/// Builds the slug index over a directory listing.
///
/// Every name counts toward `file_count`; only recognized images are grouped.
/// Slugs and files keep the order they were first seen in. Slugs absent
/// from `names` still get a group, with no species attached.
pub fn build_index<S: AsRef<str>>(file_names: &[S], names: &NameTable) -> ImageIndex {
    let mut images: IndexMap<String, ImageGroup> = IndexMap::new();

    for file_name in file_names {
        let file_name = file_name.as_ref();
        let Some(stem) = image_stem(file_name) else {
            debug!("Not an image, counted only: {}", file_name);
            continue;
        };
        let slug = resolve(stem, names);
        images.entry(slug).or_default().files.push(file_name.to_string());
    }

    let mut matched = 0;
    for (slug, group) in images.iter_mut() {
        if let Some(record) = names.get(slug) {
            group.species_id = record.id.clone();
            group.scientific_name = Some(record.scientific_name.clone());
            matched += 1;
        }
    }

    ImageIndex {
        generated_from: String::new(),
        file_count: file_names.len(),
        species_count: images.len(),
        matched_to_names_csv: matched,
        images,
    }
}

/// Lists the regular files directly inside `dir`, sorted by name.
///
/// A missing directory is a configuration error.
pub fn list_image_dir(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(CrateError::MissingDirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        // Follows symlinks, so linked images are listed too.
        if !entry.path().is_file() {
            continue;
        }
        files.push(entry.file_name().to_string_lossy().into_owned());
    }
    files.sort();
    Ok(files)
}
