use crate::config::Config;
use crate::github_requests::get_latest_tag;
use crate::helpers::directories::{self, WorkDirs};
use crate::helpers::{filesystem, unarchive};
use crate::models::{ActionOutput, Request};
use anyhow::{anyhow, Result};
use futures_util::stream::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

pub const SUCCESS_MESSAGE: &str = "Download and extraction completed successfully";

/// Downloads the latest tag of `owner/repo` and leaves its contents in `unzipped-<name>`.
///
/// Every step has to succeed before the next one runs; the first failure is
/// returned as is and the working directories are left for inspection.
pub async fn start(request: &Request, client: &Client, config: &Config) -> Result<ActionOutput> {
    let name = request.require("name")?;
    let owner = request.require("owner")?;
    let repo = request.require("repo")?;

    let base = directories::get_base_directory(config);
    let dirs = WorkDirs::new(&base, name);
    dirs.create().await?;

    let tag = get_latest_tag(client, config.github_api_url(), owner, repo).await?;
    info!("Latest tag of {owner}/{repo} is {}", tag.name);

    let zip_path = dirs.downloads.join(archive_file_name(&tag.name));
    download_file(client, &zip_path, &tag.zipball_url).await?;

    if let Err(error) = unarchive::start(&zip_path, &dirs.temp).await {
        return Err(anyhow!("Error unzipping {}: {error}", zip_path.display()));
    }

    if let Err(error) = filesystem::move_nested_contents(&dirs.temp, &dirs.unzip).await {
        return Err(anyhow!("Error moving nested contents: {error}"));
    }

    for dir in [&dirs.temp, &dirs.downloads] {
        if let Err(error) = filesystem::remove_dir(dir).await {
            warn!("{error}");
        }
    }

    Ok(ActionOutput::Download {
        message: SUCCESS_MESSAGE.to_string(),
        latest_tag: tag.name,
        unzip_dir: dirs.unzip.display().to_string(),
    })
}

/// File name the zipball of `tag` is saved under; tags like `release/1.0` stay one file.
fn archive_file_name(tag: &str) -> String {
    format!("{}.zip", tag.replace(['/', '\\'], "-"))
}

/// Streams the body behind `url` into `destination`.
///
/// A failure halfway leaves the partial file in place.
pub async fn download_file(client: &Client, destination: &Path, url: &str) -> Result<()> {
    let response = match client.get(url).header("user-agent", "tagpull").send().await {
        Ok(response) => response,
        Err(error) => return Err(anyhow!("Error downloading {url}: {error}")),
    };

    if !response.status().is_success() {
        return Err(anyhow!(
            "Error downloading {url}: received status code {}",
            response.status().as_u16()
        ));
    }

    let pb = match response.content_length() {
        Some(total_size) => {
            let pb = ProgressBar::new(total_size);
            pb.set_style(ProgressStyle::default_bar()
                .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
                .progress_chars("█  "));
            pb
        }
        None => ProgressBar::new_spinner(),
    };
    pb.set_message(format!("Downloading {url}"));

    let mut file = match tokio::fs::File::create(destination).await {
        Ok(file) => file,
        Err(error) => {
            return Err(anyhow!(
                "Failed to create {}: {error}",
                destination.display()
            ));
        }
    };

    let mut response_bytes = response.bytes_stream();
    while let Some(item) = response_bytes.next().await {
        let chunk = item.map_err(|error| anyhow!("Error downloading {url}: {error}"))?;
        file.write_all(&chunk).await?;
        pb.inc(chunk.len() as u64);
    }
    file.flush().await?;

    pb.finish_with_message(format!("Downloaded {url} to {}", destination.display()));

    Ok(())
}
