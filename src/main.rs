pub mod cli;
pub mod csv_handler;
pub mod dataset;
pub mod error;
pub mod fishbase;
pub mod image_index;
pub mod output;
pub mod search;
pub mod taxon;

use clap::Parser;
use cli::{Cli, Command, DatasetArgs};
use csv_handler::{load_name_list, load_name_table, write_columnar, write_scientific_names};
use dataset::{FishRecord, delimiter_for, load_records};
use error::{CrateError, Result};
use fishbase::downloader::{DownloadOptions, build_client, download_species_images};
use fishbase::pictures::load_picture_manifest;
use image_index::{build_index, list_image_dir};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use output::write_json_pretty;
use std::path::{Path, PathBuf};
use std::time::Instant;
use taxon::normalize;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = env_logger::Builder::new()
        .format_target(false)
        .format_timestamp_secs()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init()
    {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = Cli::parse();
    let start_time = Instant::now();

    let result = match cli.command {
        Command::Index {
            images_dir,
            names_csv,
            out,
        } => run_index(&images_dir, &names_csv, &out),
        Command::ExportNames { dataset, out } => run_export_names(&dataset, &out),
        Command::Convert { dataset, out } => run_convert(&dataset, &out),
        Command::Search { dataset, terms } => run_search(&dataset, &terms),
        Command::Download {
            dataset,
            pictures,
            names_csv,
            out_dir,
            index_out,
            root,
            limit,
            requests_per_second,
            base_url,
        } => {
            let options = DownloadOptions {
                out_dir,
                root,
                limit,
                requests_per_second,
            };
            run_download(
                &dataset,
                &pictures,
                names_csv.as_deref(),
                &base_url,
                &options,
                &index_out,
            )
            .await
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        return Err(e);
    }

    info!("Total execution time: {:.2?}", start_time.elapsed());
    Ok(())
}

fn run_index(images_dir: &Path, names_csv: &Path, out: &Path) -> Result<()> {
    let images_dir = absolute(images_dir)?;
    info!("Scanning images in {}", images_dir.display());
    let files = list_image_dir(&images_dir)?;

    let names = load_name_table(names_csv)?;
    if names.is_empty() {
        warn!(
            "No scientific names loaded from {}; images will not be enriched",
            names_csv.display()
        );
    } else {
        info!("Loaded {} scientific names", names.len());
    }

    let index = build_index(&files, &names).with_source(images_dir.display().to_string());
    write_json_pretty(&index, out)?;

    println!("Wrote: {}", absolute(out)?.display());
    println!("Files scanned: {}", index.file_count);
    println!("Species (unique slugs): {}", index.species_count);
    println!("Matched to names CSV: {}", index.matched_to_names_csv);
    Ok(())
}

fn load_dataset(dataset: &DatasetArgs) -> Result<Vec<FishRecord>> {
    info!("Loading {}...", dataset.input.display());
    let records = load_records(&dataset.input, dataset.format)?;
    info!("Parsed {} species", records.len());
    Ok(records)
}

fn run_export_names(dataset: &DatasetArgs, out: &Path) -> Result<()> {
    let records = load_dataset(dataset)?;
    let written = write_scientific_names(&records, out)?;
    println!("Wrote {} names to {}", written, out.display());
    Ok(())
}

fn run_convert(dataset: &DatasetArgs, out: &Path) -> Result<()> {
    let records = load_dataset(dataset)?;
    let summary = write_columnar(&records, out, delimiter_for(out))?;
    println!(
        "Wrote {} rows x {} columns to {}",
        summary.rows,
        summary.columns,
        out.display()
    );
    Ok(())
}

fn run_search(dataset: &DatasetArgs, terms: &[String]) -> Result<()> {
    let records = load_dataset(dataset)?;
    for term in terms {
        let hits = search::search(&records, term);
        print!("{}", search::format_results(term, &hits));
    }
    Ok(())
}

async fn run_download(
    dataset: &DatasetArgs,
    pictures: &Path,
    names_csv: Option<&Path>,
    base_url: &str,
    options: &DownloadOptions,
    index_out: &Path,
) -> Result<()> {
    let species = load_dataset(dataset)?;

    let mut catalog = load_picture_manifest(pictures, base_url)?;
    info!(
        "Manifest lists {} pictures for {} species",
        catalog.picture_count(),
        catalog.species_count()
    );

    if let Some(names_csv) = names_csv {
        let wanted = load_name_list(names_csv)?;
        if wanted.is_empty() {
            return Err(CrateError::EmptyNameList(names_csv.to_path_buf()));
        }
        catalog.retain_species(|name| wanted.contains(&normalize(name)));
        info!(
            "Downloading only the {} species listed in {}",
            wanted.len(),
            names_csv.display()
        );
    }

    let client = build_client()?;
    let pb = ProgressBar::new(species.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-"),
    );

    let report = download_species_images(&species, &catalog, &client, options, &pb).await?;
    pb.finish_with_message("Downloads complete.");

    write_json_pretty(&report.index, index_out)?;

    println!("\n--- Download Summary ---");
    println!("Species indexed: {}", report.index.len());
    println!("Pictures downloaded: {}", report.downloaded);
    println!("Pictures already present: {}", report.already_present);
    println!("Failed downloads: {}", report.failed);
    println!("Images saved to {}", options.out_dir.display());
    println!("Index written to {}", index_out.display());
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}
