use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tracing::warn;

use crate::cli::{runtime, OutputFormat, Workspace};
use crate::core::types::SystemId;
use crate::verify::{
    FileHasher, HashProgress, VerificationEngine, VerificationReport, VerificationRequest,
};

#[derive(Args)]
pub struct VerifyArgs {
    /// Dump files to verify
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Restrict the search to one system, e.g. "redump/sony-playstation"
    #[arg(short, long)]
    pub system: Option<String>,

    /// Match against one named entry of --system, probing header offsets
    #[arg(short, long, requires = "system")]
    pub game: Option<String>,

    /// Do not draw a progress bar
    #[arg(long)]
    pub no_progress: bool,
}

pub fn run(args: VerifyArgs, workspace: &Workspace, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let mut request = VerificationRequest::new(args.files);
    if let Some(system) = args.system {
        request = request.with_system(SystemId::new(system));
    }
    if let Some(game) = args.game {
        request = request.with_game(game);
    }

    let show_progress = !args.no_progress && matches!(format, OutputFormat::Text);

    let report = runtime()?.block_on(async {
        let (store, _) = workspace.load().await?;

        if let Some(system_id) = &request.system_hint {
            if store.get(system_id).is_none() {
                warn!("System {system_id} is not loaded, no file can match. Use 'dump-verifier systems' to list loaded systems.");
            }
        }
        if verbose {
            eprintln!("Loaded {} systems ({} entries)", store.len(), store.entry_count());
        }

        let (hasher, progress_task) = if show_progress {
            let (tx, rx) = mpsc::channel(64);
            let bar = progress_bar()?;
            (FileHasher::with_progress(tx), Some(tokio::spawn(render_progress(rx, bar))))
        } else {
            (FileHasher::new(), None)
        };

        let report = VerificationEngine::new(&store, &hasher).verify(&request).await;

        drop(hasher);
        if let Some(task) = progress_task {
            let _ = task.await;
        }
        anyhow::Ok(report)
    })?;

    print_report(&report, format)
}

fn progress_bar() -> anyhow::Result<ProgressBar> {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")?
            .progress_chars("=>-"),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    Ok(bar)
}

async fn render_progress(mut rx: mpsc::Receiver<HashProgress>, bar: ProgressBar) {
    while let Some(progress) = rx.recv().await {
        bar.set_length(progress.total_bytes);
        bar.set_position(progress.bytes_processed);
    }
    bar.finish_and_clear();
}

fn print_report(report: &VerificationReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            for outcome in &report.outcomes {
                let hash = outcome.computed_hash.as_deref().unwrap_or("-");
                match &outcome.matched_entry {
                    Some(entry) => {
                        println!("[MATCH]    {}", outcome.path.display());
                        println!("  Entry:   {} ({})", entry.name, entry.system_id);
                        println!("  SHA-1:   {hash}");
                        if let Some(offset) = outcome.matched_offset.filter(|&o| o > 0) {
                            println!("  Offset:  {offset} header bytes skipped");
                        }
                    }
                    None if outcome.computed_hash.is_none() => {
                        println!("[ERROR]    {}", outcome.path.display());
                    }
                    None => {
                        println!("[NO MATCH] {}", outcome.path.display());
                        println!("  SHA-1:   {hash}");
                    }
                }
            }
            println!();
            println!("Verified {}/{} files", report.successful, report.total);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Tsv => {
            println!("path\tmatched\tsha1\tentry\tsystem\toffset");
            for outcome in &report.outcomes {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    outcome.path.display(),
                    outcome.matched,
                    outcome.computed_hash.as_deref().unwrap_or(""),
                    outcome.matched_entry.as_ref().map_or("", |e| e.name.as_str()),
                    outcome
                        .matched_entry
                        .as_ref()
                        .map_or("", |e| e.system_id.as_str()),
                    outcome.matched_offset.map(|o| o.to_string()).unwrap_or_default(),
                );
            }
        }
    }
    Ok(())
}
