mod commands;
mod config;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "testlab")]
#[command(about = "TestLab operator tools")]
struct Cli {
    /// Data directory holding config.json (defaults to RAILWAY_VOLUME_MOUNT_PATH, /data, ./data)
    #[arg(long, global = true, env = "DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the admin password stored in config.json
    ResetPassword {
        /// New password, at least 6 characters
        password: String,
    },
    /// Copy active API keys from the SQLite database into api_keys.json
    SyncApiKeys {
        /// SQLite database file (defaults to testlab.db in the data directory)
        #[arg(long)]
        database: Option<PathBuf>,
        /// Output file (defaults to api_keys.json in the data directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Check whether a TestLab server is up
    Status {
        #[arg(long, default_value = "http://127.0.0.1:3001")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ResetPassword { password } => {
            let data_dir = config::locate_data_dir(cli.data_dir)?;
            commands::reset_password::run(&data_dir, &password).await
        }
        Commands::SyncApiKeys { database, output } => {
            let data_dir = config::resolve_data_dir(cli.data_dir);
            commands::sync_api_keys::run(&data_dir, database, output).await
        }
        Commands::Status { url } => commands::status::run(&url).await,
    }
}
