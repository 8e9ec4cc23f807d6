//! FishBase picture manifests and the image downloader.
pub mod downloader;
pub mod pictures;
