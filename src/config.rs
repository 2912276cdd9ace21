use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use crate::classify::ClassificationStats;
use crate::decompose::decompose;
use crate::kv_store::{DbReader, RecordStore};
use crate::taxonomy::Taxonomy;
use crate::utilities::split_ranks;

/// Assigns each query of a taxon database to the lowest common ancestor of its taxa.
#[derive(Parser, Debug, Clone)]
#[clap(name = "taxa2lca", author, version, about, long_about = None)]
pub struct Options {
    /// nodes.dmp file of the taxonomy (may be gzipped)
    #[clap(long, default_value = "nodes.dmp", value_parser)]
    pub nodes: PathBuf,

    /// names.dmp file of the taxonomy (may be gzipped)
    #[clap(long, default_value = "names.dmp", value_parser)]
    pub names: PathBuf,

    /// Input taxon database (data file)
    #[clap(short = 'd', long = "db", default_value = "taxons_db", value_parser)]
    pub database: PathBuf,

    /// Input taxon database index [default: <db>.index]
    #[clap(short = 'i', long = "index", value_parser)]
    pub index: Option<PathBuf>,

    /// Output TSV file; with several workers each writes <output>.<worker>
    #[clap(short = 'o', long, default_value = "taxa.tsv", value_parser)]
    pub output: PathBuf,

    /// Number of workers (0 uses every CPU)
    #[clap(short = 'p', long = "threads", alias = "nprocs", default_value_t = 4, value_parser)]
    pub num_threads: usize,

    /// Colon-separated taxonomic ranks to report, e.g. "genus:family"
    #[clap(short = 'l', long, default_value = "", value_parser)]
    pub levels: String,

    /// Log per-worker progress
    #[clap(short = 'v', long, action)]
    pub verbose: bool,
}

impl Options {
    /// Validates the options and freezes them into a [`Config`].
    pub fn into_config(self) -> Result<Config> {
        let num_workers = match self.num_threads {
            0 => num_cpus::get(),
            n => n,
        };

        let index = self.index.unwrap_or_else(|| {
            let mut name = self.database.as_os_str().to_owned();
            name.push(".index");
            PathBuf::from(name)
        });

        let config = Config {
            nodes_filename: self.nodes,
            names_filename: self.names,
            database_filename: self.database,
            index_filename: index,
            output_filename: self.output,
            num_workers,
            ranks: split_ranks(&self.levels),
        };
        config.check_inputs()?;
        Ok(config)
    }
}

/// Immutable run configuration, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub nodes_filename: PathBuf,
    pub names_filename: PathBuf,
    pub database_filename: PathBuf,
    pub index_filename: PathBuf,
    /// Output file, or prefix of the per-worker files
    pub output_filename: PathBuf,
    pub num_workers: usize,
    /// Ranks to project each LCA onto; empty disables the projection column
    pub ranks: Vec<String>,
}

impl Config {
    fn check_inputs(&self) -> Result<()> {
        if self.num_workers == 0 {
            bail!("number of workers can't be less than 1");
        }
        for (what, path) in [
            ("nodes file", &self.nodes_filename),
            ("names file", &self.names_filename),
            ("taxon database", &self.database_filename),
            ("taxon database index", &self.index_filename),
        ] {
            if !path.is_file() {
                bail!("{} {} does not exist", what, path.display());
            }
        }
        Ok(())
    }
}

/// Loads the taxonomy, resolves every record of the database and writes the results.
///
/// The record store stays open until all workers have returned.
pub fn run(config: &Config) -> Result<ClassificationStats> {
    let start_time = Instant::now();

    let taxonomy = Taxonomy::from_files(&config.nodes_filename, &config.names_filename)
        .context("failed to load taxonomy")?;

    let reader = DbReader::open(&config.database_filename, &config.index_filename)
        .context("failed to open taxon database")?;

    let jobs = decompose(reader.size(), config.num_workers);
    info!(
        "Resolving {} records with {} workers",
        reader.size(),
        config.num_workers
    );

    let stats = crate::workers::run_jobs(
        jobs,
        &taxonomy,
        &reader,
        &config.ranks,
        &config.output_filename,
    )?;
    drop(reader);

    info!(
        "{} records processed ({} resolved, {} unknown, {} empty skipped)",
        stats.total_records,
        stats.total_classified(),
        stats.unknown_records,
        stats.skipped_records
    );
    info!(
        "Done in {:.3} seconds",
        start_time.elapsed().as_secs_f64()
    );
    Ok(stats)
}
