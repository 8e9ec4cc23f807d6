use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrateError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("Input file does not exist: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("No species names found in {}", .0.display())]
    EmptyNameList(PathBuf),

    #[error("Could not find the fishDatabase export in {}", .path.display())]
    DatasetExportNotFound { path: PathBuf },

    #[error("Failed to parse dataset {}: {reason}", .path.display())]
    DatasetParse { path: PathBuf, reason: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Download returned status {status} for {url}")]
    DownloadStatus {
        status: reqwest::StatusCode,
        url: String,
    },
}

pub type Result<T> = std::result::Result<T, CrateError>;
