use anyhow::{anyhow, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Config {
    pub base_directory: Option<String>,
    pub github_api_url: Option<String>,
}

impl Config {
    pub fn github_api_url(&self) -> &str {
        self.github_api_url
            .as_deref()
            .unwrap_or(DEFAULT_GITHUB_API_URL)
            .trim_end_matches('/')
    }
}

/// Loads the config file.
///
/// An explicitly given path has to exist, the default location is optional.
pub async fn handle_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => match fs::read_to_string(path).await {
            Ok(contents) => parse_config(&contents)?,
            Err(error) => {
                return Err(anyhow!(
                    "Failed to read config file {}: {error}",
                    path.display()
                ));
            }
        },
        None => read_default_config(crate::helpers::directories::get_config_file()).await?,
    };

    Ok(config)
}

/// Reads the default config file; no resolvable location or no file means defaults.
async fn read_default_config(config_file: Result<PathBuf>) -> Result<Config> {
    let config_file = match config_file {
        Ok(path) => path,
        Err(_) => return Ok(Config::default()),
    };

    match fs::read_to_string(config_file).await {
        Ok(contents) => parse_config(&contents),
        Err(_) => Ok(Config::default()),
    }
}

fn parse_config(contents: &str) -> Result<Config> {
    let mut config: Config = serde_json::from_str(contents)
        .map_err(|error| anyhow!("Invalid config file: {error}"))?;
    handle_envars(&mut config)?;

    Ok(config)
}

fn handle_envars(config: &mut Config) -> Result<()> {
    let re = Regex::new(r"\$([A-Z_]+)")?;

    handle_envar(&mut config.base_directory, &re)?;

    handle_envar(&mut config.github_api_url, &re)?;

    Ok(())
}

fn handle_envar(item: &mut Option<String>, re: &Regex) -> Result<()> {
    let value = if let Some(value) = item.as_ref() {
        value
    } else {
        return Ok(());
    };

    let mut expanded = String::with_capacity(value.len());
    let mut last = 0;
    for captures in re.captures_iter(value) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let var = match env::var(name.as_str()) {
            Ok(var) => var,
            Err(_) => {
                return Err(anyhow!(
                    "Couldn't find {} environment variable",
                    name.as_str()
                ));
            }
        };
        expanded.push_str(&value[last..whole.start()]);
        expanded.push_str(&var);
        last = whole.end();
    }
    expanded.push_str(&value[last..]);

    *item = Some(expanded);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config_expands_envars() {
        let path = env::var("PATH").unwrap_or_default();
        let config = parse_config(r#"{"base_directory": "$PATH/work"}"#).unwrap();

        assert_eq!(config.base_directory, Some(format!("{path}/work")));
        assert_eq!(config.github_api_url, None);
    }

    #[test]
    fn unknown_envar_is_an_error() {
        let error = parse_config(r#"{"github_api_url": "$TAGPULL_SURELY_UNSET_VARIABLE"}"#)
            .unwrap_err();

        assert!(
            error
                .to_string()
                .contains("Couldn't find TAGPULL_SURELY_UNSET_VARIABLE environment variable")
        );
    }

    #[tokio::test]
    async fn unresolvable_default_location_means_defaults() {
        let config = read_default_config(Err(anyhow!("environment variable not found")))
            .await
            .unwrap();

        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn missing_default_file_means_defaults() {
        let dir = tempfile::TempDir::new().unwrap();

        let config = read_default_config(Ok(dir.path().join("config.json")))
            .await
            .unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn invalid_config_is_an_error() {
        assert!(parse_config("{ not json").is_err());
    }

    #[test]
    fn github_api_url_defaults_and_trims() {
        assert_eq!(Config::default().github_api_url(), DEFAULT_GITHUB_API_URL);

        let config = Config {
            github_api_url: Some("http://localhost:8080/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.github_api_url(), "http://localhost:8080");
    }

    #[tokio::test]
    async fn explicit_config_path_must_exist() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("config.json");

        assert!(handle_config(Some(missing.as_path())).await.is_err());

        std::fs::write(&missing, r#"{"base_directory": "/srv/tagpull"}"#).unwrap();
        let config = handle_config(Some(missing.as_path())).await.unwrap();
        assert_eq!(config.base_directory.as_deref(), Some("/srv/tagpull"));
    }
}
