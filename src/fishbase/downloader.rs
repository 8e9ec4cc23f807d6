//! Fetching species pictures listed in a FishBase manifest.
use super::pictures::{PictureCatalog, picture_file_name};
use crate::dataset::FishRecord;
use crate::error::{CrateError, Result};
use crate::output::ensure_parent_dir;
use chrono::{NaiveDate, Utc};
use indicatif::ProgressBar;
use log::{debug, warn};
use reqwest::Client;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const USER_AGENT: &str = concat!("fishdex/", env!("CARGO_PKG_VERSION"));
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Where picture files are written.
    pub out_dir: PathBuf,
    /// Paths in the index are made relative to this directory.
    pub root: PathBuf,
    /// Maximum pictures kept per species; 0 keeps all.
    pub limit: usize,
    pub requests_per_second: u32,
}

impl DownloadOptions {
    fn delay(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.requests_per_second.max(1)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadedImage {
    #[serde(rename = "picName")]
    pub pic_name: String,
    pub url: String,
    pub path: String,
    pub retrieved_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeciesImages {
    #[serde(rename = "scientificName")]
    pub scientific_name: String,
    pub images: Vec<DownloadedImage>,
}

/// Species id to the pictures stored for it.
pub type DownloadIndex = BTreeMap<String, SpeciesImages>;

#[derive(Debug, Default)]
pub struct DownloadReport {
    pub index: DownloadIndex,
    pub downloaded: usize,
    pub already_present: usize,
    pub failed: usize,
}

pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(CrateError::HttpClient)
}

/// Fetches `url` into `path`. Non-success statuses are errors.
pub async fn download_image(client: &Client, url: &str, path: &Path) -> Result<()> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CrateError::DownloadStatus {
            status,
            url: url.to_string(),
        });
    }
    let bytes = response.bytes().await?;
    ensure_parent_dir(path)?;
    tokio::fs::write(path, &bytes).await?;
    Ok(())
}

/// Downloads the manifest pictures of every species with a scientific name.
///
/// Requests are issued one at a time, spaced by the configured rate. Files
/// already on disk are reused. A failed picture is logged and left out of
/// the index; it never aborts the run.
pub async fn download_species_images(
    species: &[FishRecord],
    catalog: &PictureCatalog,
    client: &Client,
    options: &DownloadOptions,
    pb: &ProgressBar,
) -> Result<DownloadReport> {
    tokio::fs::create_dir_all(&options.out_dir).await?;
    let mut report = DownloadReport::default();
    let delay = options.delay();

    for record in species {
        let Some(name) = record.scientific_name() else {
            pb.inc(1);
            continue;
        };
        let pictures = catalog.for_species(name);
        let species_id = record
            .id()
            .or_else(|| pictures.iter().find_map(|p| p.spec_code.clone()))
            .unwrap_or_else(|| name.to_string());
        pb.set_message(name.to_string());

        let mut images = Vec::new();
        for picture in pictures {
            let file_name = picture_file_name(&species_id, name, &picture.pic_name);
            let out_path = options.out_dir.join(&file_name);

            if out_path.exists() {
                debug!("Keeping existing {}", out_path.display());
                report.already_present += 1;
            } else {
                tokio::time::sleep(delay).await;
                match download_image(client, &picture.url, &out_path).await {
                    Ok(()) => report.downloaded += 1,
                    Err(e) => {
                        warn!("Failed to download {} for {}: {}", picture.url, name, e);
                        report.failed += 1;
                        continue;
                    }
                }
            }

            images.push(DownloadedImage {
                pic_name: picture.pic_name.clone(),
                url: picture.url.clone(),
                path: relative_path(&out_path, &options.root),
                retrieved_on: Utc::now().date_naive(),
            });
            if options.limit > 0 && images.len() >= options.limit {
                break;
            }
        }

        report.index.insert(
            species_id,
            SpeciesImages {
                scientific_name: name.to_string(),
                images,
            },
        );
        pb.inc(1);
    }

    Ok(report)
}

/// `path` relative to `root` with forward slashes; unchanged when it does not
/// live under `root`.
pub fn relative_path(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fishbase::pictures::Picture;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn species() -> Vec<FishRecord> {
        [
            json!({"id": "42", "scientificName": "Poecilia reticulata"}),
            json!({"scientificName": "Carassius auratus"}),
            json!({"id": "9"}),
        ]
        .into_iter()
        .map(|v| serde_json::from_value(v).unwrap())
        .collect()
    }

    fn picture(name: &str, pic: &str, url: &str) -> Picture {
        Picture {
            scientific_name: name.to_string(),
            spec_code: None,
            pic_name: pic.to_string(),
            url: url.to_string(),
        }
    }

    fn options(root: &Path, limit: usize) -> DownloadOptions {
        DownloadOptions {
            out_dir: root.join("public").join("images").join("fish"),
            root: root.to_path_buf(),
            limit,
            requests_per_second: 1000,
        }
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        let root = Path::new("/repo/package");
        assert_eq!(
            relative_path(Path::new("/repo/package/public/images/fish/a.jpg"), root),
            "public/images/fish/a.jpg"
        );
        assert_eq!(relative_path(Path::new("/elsewhere/a.jpg"), root), "/elsewhere/a.jpg");
    }

    #[tokio::test]
    async fn existing_files_are_indexed_without_requests() {
        let dir = tempdir().unwrap();
        let opts = options(dir.path(), 0);
        fs::create_dir_all(&opts.out_dir).unwrap();
        fs::write(opts.out_dir.join("42_Poecilia_reticulata_Poret_m0.jpg"), b"jpg").unwrap();
        fs::write(opts.out_dir.join("42_Poecilia_reticulata_Poret_f1.jpg"), b"jpg").unwrap();

        let catalog = PictureCatalog::from_pictures([
            picture("Poecilia reticulata", "Poret_m0.jpg", "http://127.0.0.1:1/Poret_m0.jpg"),
            picture("Poecilia reticulata", "Poret_f1.jpg", "http://127.0.0.1:1/Poret_f1.jpg"),
        ]);
        let client = build_client().unwrap();
        let report = download_species_images(&species(), &catalog, &client, &opts, &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(report.already_present, 2);
        assert_eq!(report.downloaded, 0);
        assert_eq!(report.failed, 0);

        let guppy = &report.index["42"];
        assert_eq!(guppy.scientific_name, "Poecilia reticulata");
        assert_eq!(guppy.images.len(), 2);
        assert_eq!(
            guppy.images[0].path,
            "public/images/fish/42_Poecilia_reticulata_Poret_m0.jpg"
        );

        let goldfish = &report.index["Carassius auratus"];
        assert!(goldfish.images.is_empty());
        assert_eq!(report.index.len(), 2);
    }

    #[tokio::test]
    async fn limit_caps_pictures_per_species() {
        let dir = tempdir().unwrap();
        let opts = options(dir.path(), 1);
        fs::create_dir_all(&opts.out_dir).unwrap();
        fs::write(opts.out_dir.join("42_Poecilia_reticulata_a.jpg"), b"").unwrap();
        fs::write(opts.out_dir.join("42_Poecilia_reticulata_b.jpg"), b"").unwrap();

        let catalog = PictureCatalog::from_pictures([
            picture("Poecilia reticulata", "a.jpg", "http://127.0.0.1:1/a.jpg"),
            picture("Poecilia reticulata", "b.jpg", "http://127.0.0.1:1/b.jpg"),
        ]);
        let client = build_client().unwrap();
        let report = download_species_images(&species(), &catalog, &client, &opts, &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(report.index["42"].images.len(), 1);
        assert_eq!(report.index["42"].images[0].pic_name, "a.jpg");
    }

    #[tokio::test]
    async fn failed_downloads_are_skipped() {
        let dir = tempdir().unwrap();
        let opts = options(dir.path(), 0);
        let catalog = PictureCatalog::from_pictures([picture(
            "Carassius auratus",
            "Caaur_u1.jpg",
            "http://127.0.0.1:1/Caaur_u1.jpg",
        )]);
        let client = build_client().unwrap();
        let report = download_species_images(&species(), &catalog, &client, &opts, &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        assert!(report.index["Carassius auratus"].images.is_empty());
        assert!(!opts.out_dir.join("Carassius_auratus_Carassius_auratus_Caaur_u1.jpg").exists());
    }

    #[tokio::test]
    async fn unlisted_species_stay_indexed_without_images() {
        let dir = tempdir().unwrap();
        let opts = options(dir.path(), 0);
        fs::create_dir_all(&opts.out_dir).unwrap();
        fs::write(opts.out_dir.join("42_Poecilia_reticulata_Poret_m0.jpg"), b"jpg").unwrap();

        let mut catalog = PictureCatalog::from_pictures([
            picture("Poecilia reticulata", "Poret_m0.jpg", "http://127.0.0.1:1/Poret_m0.jpg"),
            picture("Carassius auratus", "Caaur_u1.jpg", "http://127.0.0.1:1/Caaur_u1.jpg"),
        ]);
        let wanted = std::collections::HashSet::from(["poecilia-reticulata".to_string()]);
        catalog.retain_species(|name| wanted.contains(&crate::taxon::normalize(name)));

        let client = build_client().unwrap();
        let report = download_species_images(&species(), &catalog, &client, &opts, &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(report.failed, 0);
        assert_eq!(report.already_present, 1);
        assert_eq!(report.index["42"].images.len(), 1);
        assert!(report.index["Carassius auratus"].images.is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn test_download_live_picture() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Poret_m0.jpg");
        let client = build_client().unwrap();
        download_image(
            &client,
            "https://www.fishbase.se/images/species/Poret_m0.jpg",
            &path,
        )
        .await
        .unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }
}
