use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Args;
use serde::Serialize;

use crate::catalog::store::CatalogStore;
use crate::cli::{print_ingest_reports, runtime, OutputFormat, Workspace};
use crate::core::types::{Origin, SystemId};
use crate::ingest::no_intro::NoIntroIngestor;
use crate::ingest::redump::RedumpIngestor;

#[derive(Args)]
pub struct GamesArgs {
    /// System id, e.g. "redump/sony-playstation"
    #[arg(short, long, required = true)]
    pub system: String,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Datfiles to import (.dat only)
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,
}

#[derive(Args)]
pub struct PurgeArgs {
    /// Origin to purge ("redump" or "no-intro")
    #[arg(required = true)]
    pub origin: String,
}

#[derive(Serialize)]
struct GameRow<'a> {
    name: &'a str,
    extension: &'a str,
    size: u64,
    sha1: &'a str,
}

/// Truncate a string for column display
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

pub fn run_systems(workspace: &Workspace, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let (store, _) = runtime()?.block_on(workspace.load())?;
    let systems = store.get_all_systems();

    if verbose {
        eprintln!("Loaded {} systems", systems.len());
    }

    match format {
        OutputFormat::Text => {
            let id_width = systems
                .iter()
                .map(|s| s.system_id.as_str().len())
                .max()
                .unwrap_or(6)
                .max(6);

            println!("Loaded systems ({})\n", systems.len());
            println!("{:<id_w$} {:>8}", "System", "Entries", id_w = id_width);
            println!("{}", "-".repeat(id_width + 9));
            for s in &systems {
                println!("{:<id_w$} {:>8}", s.display_name, s.entry_count, id_w = id_width);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&systems)?),
        OutputFormat::Tsv => {
            println!("system_id\tdisplay_name\tentries");
            for s in &systems {
                println!("{}\t{}\t{}", s.system_id, s.display_name, s.entry_count);
            }
        }
    }

    Ok(())
}

pub fn run_games(args: GamesArgs, workspace: &Workspace, format: OutputFormat) -> anyhow::Result<()> {
    let (store, _) = runtime()?.block_on(workspace.load())?;
    print_games(&store, &SystemId::new(args.system), format)
}

fn print_games(store: &CatalogStore, system_id: &SystemId, format: OutputFormat) -> anyhow::Result<()> {
    if store.get(system_id).is_none() {
        bail!("Unknown system: {system_id}. Use 'dump-verifier systems' to list loaded systems.");
    }

    let rows: Vec<GameRow> = store
        .get_entries(system_id)
        .iter()
        .map(|e| GameRow {
            name: &e.name,
            extension: &e.extension,
            size: e.size_bytes,
            sha1: &e.content_hash,
        })
        .collect();

    match format {
        OutputFormat::Text => {
            println!("{system_id} ({} entries)\n", rows.len());
            for row in &rows {
                println!("{:<70} {:>12}", truncate(row.name, 70), row.size);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Tsv => {
            println!("name\textension\tsize\tsha1");
            for row in &rows {
                println!("{}\t{}\t{}\t{}", row.name, row.extension, row.size, row.sha1);
            }
        }
    }

    Ok(())
}

pub fn run_update(workspace: &Workspace, format: OutputFormat) -> anyhow::Result<()> {
    if workspace.offline {
        bail!("Cannot update Redump catalogs with --offline");
    }

    let report = runtime()?.block_on(async {
        workspace.layout.ensure().await?;
        let fetcher = workspace.fetcher()?;
        let mut store = CatalogStore::new();
        let report = RedumpIngestor::new(&fetcher, &workspace.layout, &workspace.ingest)
            .refresh(&mut store)
            .await?;
        anyhow::Ok(report)
    })?;

    print_ingest_reports(&[report], format)
}

pub fn run_import(args: ImportArgs, workspace: &Workspace, format: OutputFormat) -> anyhow::Result<()> {
    let report = runtime()?.block_on(async {
        workspace.layout.ensure().await?;
        let mut store = CatalogStore::new();
        let report = NoIntroIngestor::new(&workspace.layout)
            .import(&args.files, &mut store)
            .await?;
        anyhow::Ok(report)
    })?;

    print_ingest_reports(&[report], format)
}

pub fn run_purge(args: PurgeArgs, workspace: &Workspace, format: OutputFormat) -> anyhow::Result<()> {
    let origin = Origin::parse(&args.origin)
        .with_context(|| format!("Unknown origin '{}'; expected 'redump' or 'no-intro'", args.origin))?;

    let removed = runtime()?.block_on(workspace.layout.purge(origin))?;

    match format {
        OutputFormat::Text => println!("Removed {removed} {origin} files"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "origin": origin, "removed": removed })
        ),
        OutputFormat::Tsv => {
            println!("origin\tremoved");
            println!("{}\t{removed}", origin.as_str());
        }
    }

    Ok(())
}
