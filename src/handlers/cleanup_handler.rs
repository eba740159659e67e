use anyhow::{anyhow, Result};
use tracing::info;

use crate::{
    config::Config,
    helpers::{directories, filesystem},
    models::{ActionOutput, Request},
};

pub const SUCCESS_MESSAGE: &str = "cleanup successful";

pub async fn start(request: &Request, config: &Config) -> Result<ActionOutput> {
    let unzip_dir = request.require("unzip_dir")?;
    let path = directories::get_base_directory(config).join(unzip_dir);

    if let Err(error) = filesystem::remove_dir(&path).await {
        return Err(anyhow!("failed to cleanup: {error}"));
    }
    info!("Removed {}", path.display());

    Ok(ActionOutput::Cleanup {
        message: SUCCESS_MESSAGE.to_string(),
    })
}
