mod cli;
mod config;
pub mod github_requests;
mod handlers;
mod helpers;
mod models;

use anyhow::Result;
use std::process::exit;
use tracing::{error, Level};

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the JSON result, everything else goes to stderr
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(collector)?;
    if let Err(error) = cli::start().await {
        error!("Error: {error}");
        exit(1);
    }
    Ok(())
}
