//! entsoe CLI - Query the ENTSO-E transparency platform.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;

use commands::query::QueryArgs;

#[derive(Parser)]
#[command(name = "entsoe")]
#[command(about = "Query the ENTSO-E transparency platform", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Query an endpoint and write the stitched result
    Query(QueryArgs),

    /// List known market areas
    Areas {
        /// Search pattern
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show area details and neighbours
    Area {
        /// Area alias (e.g., BE, DE_LU) or EIC code
        key: String,
    },

    /// Browse and download the file library
    Files {
        #[command(subcommand)]
        action: FilesAction,
    },
}

/// Actions on the file library.
#[derive(Subcommand)]
enum FilesAction {
    /// List the files of an export folder
    List {
        /// Folder below the export root (e.g., EnergyPrices_12.1.D_r3)
        folder: String,
    },

    /// Download files by name or id and write them as one tab-separated table
    Download {
        /// Folder below the export root (required with --name)
        #[arg(long)]
        folder: Option<String>,

        /// File name within the folder
        #[arg(long, conflicts_with = "id", requires = "folder")]
        name: Option<String>,

        /// File ids (repeatable)
        #[arg(long)]
        id: Vec<String>,

        /// Output file path. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Installs the tracing subscriber; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing(verbose: u8) {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let default = match verbose {
        0 => "entsoe=info",
        1 => "entsoe=debug",
        _ => "entsoe=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Query(args) => commands::query::query(args, cli.quiet).await,
        Commands::Areas { search } => commands::areas::list_areas(search.as_deref()),
        Commands::Area { key } => commands::areas::show_area(&key),
        Commands::Files { action } => match action {
            FilesAction::List { folder } => commands::files::list_folder(&folder).await,
            FilesAction::Download {
                folder,
                name,
                id,
                output,
            } => {
                commands::files::download(folder.as_deref(), name.as_deref(), &id, output).await
            }
        },
    }
}
