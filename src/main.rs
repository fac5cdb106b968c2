use clap::{Parser, Subcommand, builder::styling};
use dataset_loader::{
    cli,
    config::{LoadConfig, MergeConfig},
    postgres::{self, Connection, ConnectionParams},
    transform::JoinPolicy,
};
use eyre::{Context, Result};
use owo_colors::OwoColorize;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Dataset Loader: merge training, test and label CSV files and bulk-load the result into PostgreSQL
#[derive(Parser)]
#[command(name = "dsload", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source paths and credentials from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Override JOIN_POLICY for unlabeled rows without exactly one label
    #[arg(long, global = true, value_enum)]
    join_policy: Option<JoinPolicy>,

    /// Command to execute (defaults to `run`)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the input files, write the combined file and load it into the database
    Run,

    /// Merge the input files and write the combined file only
    Merge,

    /// Load an existing combined file into the database
    Load {
        /// CSV file to load
        input: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let dotenv = dotenvy::from_filename(&cli.env);

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    match dotenv {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {
            log::debug!("No {} file, using the process environment", cli.env)
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", cli.env)),
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let merge_config = merge_config(cli.join_policy)?;
            let load_config = LoadConfig::from_env()?;

            let combined = cli::merge_datasets(&merge_config).await?;
            let connection = connect_or_exit(&load_config.connection).await;
            cli::load_dataset(connection, &load_config, &combined).await?;
        }
        Commands::Merge => {
            let merge_config = merge_config(cli.join_policy)?;
            cli::merge_datasets(&merge_config).await?;
        }
        Commands::Load { input } => {
            let load_config = LoadConfig::from_env()?;
            let table = cli::read_dataset(&input)?;
            let connection = connect_or_exit(&load_config.connection).await;
            cli::load_dataset(connection, &load_config, &table).await?;
        }
    }

    Ok(())
}

fn merge_config(join_policy: Option<JoinPolicy>) -> Result<MergeConfig> {
    let mut config = MergeConfig::from_env()?;
    if let Some(policy) = join_policy {
        config.join_policy = policy;
    }
    Ok(config)
}

/// A database that can't be reached ends the run
async fn connect_or_exit(params: &ConnectionParams) -> Connection {
    match postgres::connect(params).await {
        Ok(connection) => connection,
        Err(e) => {
            log::error!("{}", e.red());
            std::process::exit(1);
        }
    }
}
