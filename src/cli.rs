use crate::{
    config::{self, Config},
    handlers::{cleanup_handler, download_handler},
    models::{Action, ActionOutput, Request},
};
use anyhow::{anyhow, Result};
use clap::Parser;
use reqwest::{Client, Error};
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncReadExt};

fn create_reqwest_client() -> Result<Client, Error> {
    let client = reqwest::Client::builder().user_agent("tagpull").build()?;

    Ok(client)
}

/// Fetch the latest tagged zipball of a GitHub repository, or clean one up.
///
/// The action is read as a JSON object from standard input, e.g.
/// {"action":"download","name":"x","owner":"foo","repo":"bar"} or
/// {"action":"cleanup","unzip_dir":"unzipped-x"}.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Config file to load instead of the default location
    #[arg(long, env = "TAGPULL_CONFIG")]
    config: Option<PathBuf>,

    /// Directory the working directories are created in
    #[arg(long, env = "TAGPULL_BASE_DIR")]
    base_dir: Option<String>,

    /// Base URL of the GitHub API
    #[arg(long, env = "TAGPULL_API_URL")]
    api_url: Option<String>,
}

pub async fn start() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::handle_config(cli.config.as_deref()).await?;
    if cli.base_dir.is_some() {
        config.base_directory = cli.base_dir;
    }
    if cli.api_url.is_some() {
        config.github_api_url = cli.api_url;
    }

    let client = create_reqwest_client()?;
    let request = read_input(tokio::io::stdin()).await?;

    let output = run_action(&request, &client, &config).await?;

    match serde_json::to_string(&output) {
        Ok(json) => println!("{json}"),
        Err(error) => return Err(anyhow!("Failed to marshal output: {error}")),
    }

    Ok(())
}

pub async fn read_input<R: AsyncRead + Unpin>(mut reader: R) -> Result<Request> {
    let mut input = String::new();
    reader.read_to_string(&mut input).await?;

    // only the first value counts, whatever trails it is ignored
    match serde_json::Deserializer::from_str(&input)
        .into_iter::<Request>()
        .next()
    {
        Some(Ok(request)) => Ok(request),
        Some(Err(error)) => Err(anyhow!("failed to parse input: {error}")),
        None => Err(anyhow!("failed to parse input: no JSON object on standard input")),
    }
}

pub async fn run_action(request: &Request, client: &Client, config: &Config) -> Result<ActionOutput> {
    match request.action()? {
        Action::Download => download_handler::start(request, client, config).await,
        Action::Cleanup => cleanup_handler::start(request, config).await,
    }
}
