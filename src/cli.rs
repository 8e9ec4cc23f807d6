use crate::dataset::DatasetFormat;
use crate::fishbase::pictures::BASE_PICTURE_URL;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_DATASET: &str = "package/src/fishDatabase-cleaned.js";
pub const DEFAULT_IMAGES_DIR: &str = "package/public/images/fish";
pub const DEFAULT_NAMES_CSV: &str = "package/src/data/scientific_names.csv";
pub const DEFAULT_INDEX_OUT: &str = "package/src/data/fish-images.json";
pub const DEFAULT_PACKAGE_ROOT: &str = "package";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Build the species image index from a directory of images.
    Index {
        /// Directory holding the image files.
        #[arg(long, value_name = "DIR", default_value = DEFAULT_IMAGES_DIR)]
        images_dir: PathBuf,

        /// Scientific-names CSV used to attach species ids (optional file).
        #[arg(long, value_name = "FILE", default_value = DEFAULT_NAMES_CSV)]
        names_csv: PathBuf,

        /// Where the index JSON is written.
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_INDEX_OUT)]
        out: PathBuf,
    },

    /// Export the id and scientific name of every species as CSV.
    ExportNames {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_NAMES_CSV)]
        out: PathBuf,
    },

    /// Flatten the dataset into a delimited table (tab-separated for .tsv).
    Convert {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[arg(short, long, value_name = "FILE", default_value = "fish.tsv")]
        out: PathBuf,
    },

    /// Search species by scientific or common name.
    Search {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// One or more search terms; each is searched separately.
        #[arg(required = true)]
        terms: Vec<String>,
    },

    /// Download FishBase pictures for every species in the dataset.
    Download {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Picture manifest CSV (ScientificName, SpecCode, PicName, ImageURL).
        #[arg(long, value_name = "FILE")]
        pictures: PathBuf,

        /// Only fetch pictures for species listed in this CSV (other species
        /// are still indexed, with no images).
        #[arg(long, value_name = "FILE")]
        names_csv: Option<PathBuf>,

        /// Directory the pictures are saved to.
        #[arg(long, value_name = "DIR", default_value = DEFAULT_IMAGES_DIR)]
        out_dir: PathBuf,

        /// Where the per-species download index is written.
        #[arg(long, value_name = "FILE", default_value = DEFAULT_INDEX_OUT)]
        index_out: PathBuf,

        /// Paths in the index are relative to this directory.
        #[arg(long, value_name = "DIR", default_value = DEFAULT_PACKAGE_ROOT)]
        root: PathBuf,

        /// Maximum pictures per species (0 = all).
        #[arg(long, default_value_t = 0)]
        limit: usize,

        /// Download throttle.
        #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..))]
        requests_per_second: u32,

        /// Prefix for manifest rows without an explicit ImageURL.
        #[arg(long, value_name = "URL", default_value = BASE_PICTURE_URL)]
        base_url: String,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct DatasetArgs {
    /// Species dataset (JS module, JSON array, or CSV/TSV).
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_DATASET)]
    pub input: PathBuf,

    /// Dataset format; `auto` picks by extension.
    #[arg(short, long, value_enum, default_value = "auto")]
    pub format: DatasetFormat,
}
