use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use shutterframe::Config;

mod cli;

#[derive(Parser)]
#[command(name = "shutterframe")]
#[command(about = "Browse, trash and restore photos and videos")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/shutterframe/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// How `list` groups its output
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum GroupArg {
    Folder,
    Date,
}

#[derive(Subcommand)]
enum Commands {
    /// Add every photo and video under a folder to the index
    Import {
        folder: PathBuf,
    },

    /// Show the gallery (or the trash) as a grouped list
    List {
        /// Show the trash instead of the gallery
        #[arg(short, long)]
        trash: bool,

        /// Override the view's grouping
        #[arg(short, long, value_enum)]
        group: Option<GroupArg>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show name, kind, date added, size and folder of one item
    Info {
        id: i64,
    },

    /// Move items to the trash
    Trash {
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Restore items from the trash
    Restore {
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Permanently delete items from the trash
    Delete {
        #[arg(required = true)]
        ids: Vec<i64>,

        /// Confirm the deletion (without it the request is denied)
        #[arg(short, long)]
        yes: bool,
    },

    /// Permanently delete trashed items past the retention window
    Purge,

    /// Hide index entries whose files no longer exist
    Verify,

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)?;

    // Set RUST_LOG to override the configured filter
    // Examples: RUST_LOG=debug, RUST_LOG=shutterframe=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_target(true)
        .with_level(true)
        .init();

    match cli.command {
        Commands::Import { folder } => cli::import(&config, folder).await?,
        Commands::List { trash, group, json } => cli::list(&config, trash, group, json).await?,
        Commands::Info { id } => cli::info(&config, id)?,
        Commands::Trash { ids } => cli::bulk(&config, cli::BulkCommand::Trash, &ids, true).await?,
        Commands::Restore { ids } => {
            cli::bulk(&config, cli::BulkCommand::Restore, &ids, true).await?
        }
        Commands::Delete { ids, yes } => {
            cli::bulk(&config, cli::BulkCommand::Delete, &ids, yes).await?
        }
        Commands::Purge => cli::purge(&config)?,
        Commands::Verify => cli::verify(&config)?,
        Commands::Config => print!("{}", config.to_toml()?),
    }

    Ok(())
}
