use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// A single invocation read from standard input.
///
/// Keys that are not present read as empty strings.
#[derive(Deserialize, Debug, Default)]
#[serde(transparent)]
pub struct Request {
    fields: HashMap<String, String>,
}

impl Request {
    pub fn get(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or_default()
    }

    /// Like [`Request::get`], but an empty value is an error naming the key.
    pub fn require(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            "" => Err(anyhow!("Missing required field `{key}`")),
            value => Ok(value),
        }
    }

    pub fn action(&self) -> Result<Action> {
        self.get("action").parse()
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Action {
    Download,
    Cleanup,
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "download" => Ok(Action::Download),
            "cleanup" => Ok(Action::Cleanup),
            "" => Err(anyhow!("No action provided, expected `download` or `cleanup`")),
            other => Err(anyhow!("unknown action: {other}")),
        }
    }
}

#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum ActionOutput {
    Download {
        message: String,
        latest_tag: String,
        unzip_dir: String,
    },
    Cleanup {
        message: String,
    },
}
