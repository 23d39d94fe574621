mod commands;
mod report;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// repokeeper CLI -- keep a GitHub repository's existence and visibility in
/// the declared state.
#[derive(Parser)]
#[command(name = "rk", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile one repository toward the desired state and print the result as JSON.
    Apply(commands::apply::ApplyArgs),

    /// Print the effective configuration as TOML.
    Config {
        /// Config file to read instead of `~/.repokeeper/config.toml`.
        #[arg(long)]
        config: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply(args) => Ok(commands::apply::run(&args).await),
        Commands::Config { config } => {
            commands::config::run(config.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
