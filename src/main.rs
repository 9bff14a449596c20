use clap::Parser;
use tracing_subscriber::EnvFilter;

use dump_verifier::cli::{self, Commands, Workspace};
use dump_verifier::web;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("dump_verifier=debug,info")
    } else {
        EnvFilter::new("dump_verifier=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let workspace = Workspace::from_cli(&cli)?;

    match cli.command {
        Commands::Verify(args) => {
            cli::verify::run(args, &workspace, cli.format, cli.verbose)?;
        }
        Commands::Systems => {
            cli::catalog::run_systems(&workspace, cli.format, cli.verbose)?;
        }
        Commands::Games(args) => {
            cli::catalog::run_games(args, &workspace, cli.format)?;
        }
        Commands::Update => {
            cli::catalog::run_update(&workspace, cli.format)?;
        }
        Commands::Import(args) => {
            cli::catalog::run_import(args, &workspace, cli.format)?;
        }
        Commands::Purge(args) => {
            cli::catalog::run_purge(args, &workspace, cli.format)?;
        }
        Commands::Serve(args) => {
            web::server::run(args, &workspace)?;
        }
    }

    Ok(())
}
