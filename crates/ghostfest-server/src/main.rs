//! Ghostfest server - JSON-RPC backend for the registration page and admin dashboard.
//!
//! This binary opens the registration store and serves it over HTTP.

mod handlers;
mod server;
mod session;
mod wrapper;

use anyhow::{bail, Result};
use clap::Parser;
use ghostfest_core::{GhostfestApi, SeedAccount};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "ghostfest-server")]
#[command(about = "JSON-RPC server for Ghostfest registration")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "0", env = "GHOSTFEST_PORT")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1", env = "GHOSTFEST_HOST")]
    host: String,

    /// Enable debug logging
    #[arg(short, long, env = "GHOSTFEST_DEBUG")]
    debug: bool,

    /// Directory holding the database (defaults to the user data directory)
    #[arg(long, env = "GHOSTFEST_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Owner's WhatsApp number for approval requests
    #[arg(long, env = "GHOSTFEST_OWNER_PHONE")]
    owner_phone: Option<String>,

    /// Public base URL used in reminder links
    #[arg(long, env = "GHOSTFEST_PUBLIC_URL")]
    public_url: Option<String>,

    /// Staff account to create if missing, as name:role:password (repeatable)
    #[arg(long = "account", env = "GHOSTFEST_ACCOUNTS", value_delimiter = ',')]
    accounts: Vec<String>,
}

fn default_data_dir() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join("ghostfest"),
        None => PathBuf::from("."),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting Ghostfest server");

    let data_dir = args.data_dir.unwrap_or_else(default_data_dir);
    info!("Data directory: {}", data_dir.display());

    let mut builder = GhostfestApi::builder(&data_dir).auto_create_dirs(true);
    if let Some(phone) = args.owner_phone {
        builder = builder.owner_phone(phone);
    }
    if let Some(url) = args.public_url {
        builder = builder.public_url(url);
    }
    for raw in &args.accounts {
        let Some(account) = SeedAccount::parse(raw) else {
            let name = raw.split(':').next().unwrap_or_default();
            bail!("Invalid account '{}', expected name:role:password", name);
        };
        builder = builder.seed_account(account);
    }

    // Create the API instance
    let api = builder.build()?;

    // Start the server
    let addr = server::start_server(api, &args.host, args.port).await?;

    // Print port for process supervisors and tests to read
    println!("SERVER_PORT={}", addr.port());

    info!("Ghostfest server running on {}", addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
