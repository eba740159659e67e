use anyhow::{anyhow, Result};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::info;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
    pub zipball_url: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default)]
    pub documentation_url: String,
}

pub async fn make_github_request<T: AsRef<str> + reqwest::IntoUrl>(
    client: &Client,
    url: T,
) -> Result<(StatusCode, String)> {
    let response = client
        .get(url)
        .header("user-agent", "tagpull")
        .header("Accept", "application/vnd.github.v3+json")
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    Ok((status, body))
}

/// Fetches the tags of `owner/repo` and returns the first one.
///
/// GitHub lists tags newest first, but that ordering is not documented as
/// stable.
pub async fn get_latest_tag(
    client: &Client,
    api_url: &str,
    owner: &str,
    repo: &str,
) -> Result<Tag> {
    let url = format!("{api_url}/repos/{owner}/{repo}/tags");
    info!("Fetching tags for {owner}/{repo}");

    let (status, body) = match make_github_request(client, &url).await {
        Ok(response) => response,
        Err(error) => return Err(anyhow!("Error fetching tags from {url}: {error}")),
    };

    if status != StatusCode::OK {
        let reason = match deserialize_response::<serde_json::Value>(body) {
            Err(error) => error.to_string(),
            Ok(_) => String::from("unexpected response"),
        };
        return Err(anyhow!(
            "Received status code {} from {url}: {reason}",
            status.as_u16()
        ));
    }

    let tags: Vec<Tag> = deserialize_response(body)
        .map_err(|error| anyhow!("Failed to parse tags of {owner}/{repo}: {error}"))?;

    match tags.into_iter().next() {
        Some(tag) => Ok(tag),
        None => Err(anyhow!("No tags found for {owner}/{repo}")),
    }
}

pub fn deserialize_response<T: DeserializeOwned>(response: String) -> Result<T> {
    let value: serde_json::Value = serde_json::from_str(&response)?;

    if value.get("message").is_some() {
        let result: ErrorResponse = serde_json::from_value(value)?;

        if result.documentation_url.contains("rate-limit") {
            return Err(anyhow!(
                "Github API rate limit has been reached, wait for it to reset and try again"
            ));
        }

        return Err(anyhow!(result.message));
    }

    Ok(serde_json::from_value(value)?)
}
