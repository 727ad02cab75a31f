//! biomodels-cache: command-line client for the BioModels cache
//!
//! Prints JSON to stdout; diagnostics go to stderr via tracing.

use std::path::PathBuf;
use std::process::ExitCode;

use biomodels_cache::{
    CacheClient, CacheQuery, CacheTier, Config, DateRange, FileType, JsonFileTier, SearchFilters,
};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Serialize;

/// BioModels cache CLI
#[derive(Parser)]
#[command(name = "biomodels-cache")]
#[command(version = biomodels_cache::PKG_VERSION)]
#[command(about = "Read-through cache for BioModels metadata")]
struct Args {
    /// Config file (default: ~/.biomodels-cache/config.toml, then /etc/biomodels-cache/config.toml)
    #[arg(short, long, env = "BIOMODELS_CACHE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a model by identifier (e.g. "12" or "BIOMD0000000012")
    Get {
        id: String,
    },

    /// Search cached models
    Search(SearchArgs),

    /// Refresh every tier from the remote catalog
    Update,

    /// Remove a model from every tier
    Delete {
        id: String,
    },

    /// Download a model's file from the catalog into the cache directory
    Download {
        id: String,
        /// Stored file type: xml or json
        #[arg(long, default_value = "xml")]
        format: String,
    },

    /// Describe the downloaded artifact file of a model
    File {
        id: String,
    },

    /// List configured tiers in priority order
    Tiers,

    /// Export the JSON cache file
    Export {
        dest: PathBuf,
    },

    /// Replace the JSON cache file with a previous export
    Import {
        src: PathBuf,
    },
}

#[derive(ClapArgs)]
struct SearchArgs {
    /// Free-text term matched against name, title, people and synopsis
    term: String,
    /// Keep models with this curator or author (repeatable)
    #[arg(long = "author")]
    authors: Vec<String>,
    /// Keep models from this journal (repeatable, exact match)
    #[arg(long = "journal")]
    journals: Vec<String>,
    /// Start of the publication date range (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    from: Option<String>,
    /// End of the publication date range (YYYY-MM-DD)
    #[arg(long, requires = "from")]
    to: Option<String>,
    /// 1-based page number
    #[arg(long, conflicts_with_all = ["offset", "limit"])]
    page: Option<usize>,
    /// Results per page
    #[arg(long, default_value_t = biomodels_cache::types::DEFAULT_PAGE_SIZE)]
    page_size: usize,
    /// 0-based offset
    #[arg(long)]
    offset: Option<usize>,
    /// Maximum number of results
    #[arg(long)]
    limit: Option<usize>,
}

impl SearchArgs {
    fn into_query(self) -> biomodels_cache::Result<CacheQuery> {
        let date_range = match (&self.from, &self.to) {
            (Some(from), Some(to)) => Some(DateRange::parse(from, to)?),
            _ => None,
        };
        let mut query = CacheQuery::new(self.term).filters(SearchFilters {
            authors: self.authors,
            journals: self.journals,
            date_range,
        });
        if let Some(page) = self.page {
            query = query.page(page, self.page_size);
        }
        if let Some(offset) = self.offset {
            query = query.offset(offset);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        Ok(query)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let client = || CacheClient::from_config(&config);

    match args.command {
        Command::Get { id } => match client()?.get_model(&id).await? {
            Some(resolution) => {
                if let Some(failure) = &resolution.write_failure {
                    eprintln!("warning: {failure}");
                }
                print_json(&resolution)?;
            }
            None => {
                eprintln!("model {id} not found");
                return Ok(ExitCode::FAILURE);
            }
        },
        Command::Search(search) => {
            let results = client()?.search(&search.into_query()?).await?;
            print_json(&results)?;
        }
        Command::Update => {
            let report = client()?.update_cache().await?;
            if let Some(failure) = &report.write_failure {
                eprintln!("warning: {failure}");
            }
            print_json(&report)?;
        }
        Command::Delete { id } => {
            let id = biomodels_cache::id::normalize(&id)?;
            let report = client()?.delete(&id).await?;
            print_json(&report)?;
        }
        Command::Download { id, format } => {
            let file_type: FileType = format.parse()?;
            let descriptor = client()?.download_model(&id, file_type).await?;
            print_json(&descriptor)?;
        }
        Command::File { id } => {
            let descriptor = client()?.file_descriptor(&id).await?;
            print_json(&descriptor)?;
        }
        Command::Tiers => {
            print_json(&client()?.tier_names())?;
        }
        Command::Export { dest } => {
            let tier = JsonFileTier::new(config.cache_file()?);
            let count = tier.export_to(&dest).await?;
            eprintln!("exported {count} models to {}", dest.display());
        }
        Command::Import { src } => {
            let tier = JsonFileTier::new(config.cache_file()?);
            tier.initialize().await?;
            let count = tier.import_from(&src).await?;
            eprintln!("imported {count} models into {}", tier.path().display());
        }
    }

    Ok(ExitCode::SUCCESS)
}
