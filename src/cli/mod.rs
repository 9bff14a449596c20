//! Command-line interface for dump-verifier.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **verify**: Check dumps against the loaded catalogs
//! - **systems**: List the loaded system catalogs
//! - **games**: List the entries of one system
//! - **update**: Purge cached Redump catalogs and download them again
//! - **import**: Replace the No-Intro catalogs with local datfiles
//! - **purge**: Delete every cached file of one origin
//! - **serve**: Start the JSON API
//!
//! ## Usage
//!
//! ```text
//! # Verify a dump against every system
//! dump-verifier verify "Game (USA).iso"
//!
//! # Verify a raw track against one selected game, probing header offsets
//! dump-verifier verify "Track 01.bin" --system redump/sony-playstation --game "Game (USA) (Track 01).bin"
//!
//! # Use only catalogs already on disk
//! dump-verifier --offline systems --format json
//!
//! # Load No-Intro datfiles downloaded from Dat-o-Matic
//! dump-verifier import ~/Downloads/*.dat
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::catalog::cache::DatLayout;
use crate::catalog::store::CatalogStore;
use crate::ingest::fetch::HttpFetcher;
use crate::ingest::no_intro::NoIntroIngestor;
use crate::ingest::redump::RedumpIngestor;
use crate::ingest::{IngestConfig, IngestReport, DEFAULT_TIMEOUT_SECS};

pub mod catalog;
pub mod verify;

#[derive(Parser)]
#[command(name = "dump-verifier")]
#[command(version)]
#[command(about = "Verify game media dumps against Redump and No-Intro catalogs")]
#[command(
    long_about = "dump-verifier checks that a dump of physical game media is byte-identical to a known-good reference.\n\nIt downloads Redump datfiles (and accepts imported No-Intro datfiles), keeps a normalized cache of their hashes and sizes, and matches your files against them:\n- Exact whole-file SHA-1 lookup across every system\n- Header offset probing for raw disc tracks when a game is selected"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Directory holding the catalog cache
    #[arg(long, global = true, env = "DUMP_VERIFIER_HOME")]
    pub data_dir: Option<PathBuf>,

    /// Session cookie sent with Redump downloads
    #[arg(long, global = true, env = "DUMP_VERIFIER_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,

    /// Use only catalogs already cached on disk
    #[arg(long, global = true)]
    pub offline: bool,

    /// Network timeout in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify dumps against the loaded catalogs
    Verify(verify::VerifyArgs),

    /// List loaded system catalogs
    Systems,

    /// List the entries of one system
    Games(catalog::GamesArgs),

    /// Purge cached Redump catalogs and download them again
    Update,

    /// Replace the No-Intro catalogs with local datfiles
    Import(catalog::ImportArgs),

    /// Delete every cached file of one origin
    Purge(catalog::PurgeArgs),

    /// Start the web server
    Serve(ServeArgs),
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1")]
    pub address: String,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Everything a command needs to reach the catalogs
#[derive(Debug, Clone)]
pub struct Workspace {
    pub layout: DatLayout,
    pub ingest: IngestConfig,
    pub offline: bool,
}

impl Workspace {
    /// Resolve the data directory and ingestion settings from the global flags
    ///
    /// # Errors
    ///
    /// Returns an error if no data directory was given and the platform has
    /// no default one.
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = match &cli.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .map(|d| d.join(env!("CARGO_PKG_NAME")))
                .context("No platform data directory; pass --data-dir")?,
        };

        let ingest = IngestConfig {
            session_cookie: cli.cookie.clone().filter(|c| !c.trim().is_empty()),
            timeout: Duration::from_secs(cli.timeout),
            ..IngestConfig::default()
        };

        Ok(Self {
            layout: DatLayout::new(data_dir),
            ingest,
            offline: cli.offline,
        })
    }

    /// Create the cache directories and load both origins into a fresh store
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directories cannot be created or the
    /// HTTP client cannot be built. Per-system failures are only logged.
    pub async fn load(&self) -> anyhow::Result<(CatalogStore, Vec<IngestReport>)> {
        self.layout
            .ensure()
            .await
            .with_context(|| format!("Failed to prepare {}", self.layout.root().display()))?;

        let mut store = CatalogStore::new();
        let fetcher = self.fetcher()?;
        let redump = RedumpIngestor::new(&fetcher, &self.layout, &self.ingest);
        let redump_report = if self.offline {
            redump.load_cached(&mut store).await
        } else {
            redump.run(&mut store).await
        };
        let no_intro_report = NoIntroIngestor::new(&self.layout).run(&mut store).await;

        info!(
            "{} systems loaded ({} entries)",
            store.len(),
            store.entry_count()
        );
        Ok((store, vec![redump_report, no_intro_report]))
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn fetcher(&self) -> anyhow::Result<HttpFetcher> {
        HttpFetcher::new(self.ingest.timeout, &self.ingest.user_agent)
            .context("Failed to build HTTP client")
    }
}

/// Build the runtime commands run on
pub(crate) fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to start async runtime")
}

/// Print a one-line tally per ingestion pass
pub(crate) fn print_ingest_reports(reports: &[IngestReport], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            for report in reports {
                println!("{}: loaded {}/{} catalogs", report.origin, report.loaded, report.total);
                for skipped in &report.skipped {
                    println!("  skipped {}: {}", skipped.name, skipped.reason);
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(reports)?),
        OutputFormat::Tsv => {
            println!("origin\tloaded\ttotal\tskipped");
            for report in reports {
                println!(
                    "{}\t{}\t{}\t{}",
                    report.origin.as_str(),
                    report.loaded,
                    report.total,
                    report.skipped.len()
                );
            }
        }
    }
    Ok(())
}
