use std::path::{Path, PathBuf};
use anyhow::{anyhow, Result};
use tokio::fs;

use crate::config::Config;

pub fn get_home_dir() -> Result<PathBuf> {
    if cfg!(windows) {
        let home_str = std::env::var("USERPROFILE")?;
        return Ok(PathBuf::from(home_str));
    }

    if let Ok(value) = std::env::var("HOME") {
        return Ok(PathBuf::from(value));
    }

    let mut home_str = "/home/".to_string();
    let env_value = std::env::var("USER")?;
    home_str.push_str(&env_value);

    Ok(PathBuf::from(home_str))
}

pub fn get_config_file() -> Result<PathBuf> {
    let mut home_dir = get_home_dir()?;

    if cfg!(target_os = "linux") {
        home_dir.push(".config");
    } else if cfg!(target_os = "macos") {
        home_dir.push("Library/Application Support");
    } else {
        home_dir.push("AppData/Roaming");
    }

    home_dir.push("tagpull/config.json");

    Ok(home_dir)
}

/// Directory every relative path of an invocation is resolved against.
///
/// Left empty when nothing is configured so joined paths stay relative to
/// the working directory, e.g. `unzipped-x`.
pub fn get_base_directory(config: &Config) -> PathBuf {
    match &config.base_directory {
        Some(path) => PathBuf::from(path),
        None => PathBuf::new(),
    }
}

/// The three directories a download works in, all derived from `name`.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkDirs {
    pub downloads: PathBuf,
    pub temp: PathBuf,
    pub unzip: PathBuf,
}

impl WorkDirs {
    pub fn new(base: &Path, name: &str) -> Self {
        WorkDirs {
            downloads: base.join(format!("downloads-{name}")),
            temp: base.join(format!("temp_unzip-{name}")),
            unzip: base.join(format!("unzipped-{name}")),
        }
    }

    pub async fn create(&self) -> Result<()> {
        for (label, dir) in [
            ("download", &self.downloads),
            ("temp", &self.temp),
            ("unzip", &self.unzip),
        ] {
            if let Err(error) = fs::create_dir_all(dir).await {
                return Err(anyhow!(
                    "Failed to create {label} directory {}: {error}",
                    dir.display()
                ));
            }
        }

        Ok(())
    }
}
