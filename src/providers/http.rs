use reqwest::{Client, StatusCode};
use url::Url;

use crate::error::{GcbError, Result};

pub fn client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("gcbmgr/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| GcbError::Config(format!("Failed to create HTTP client: {e}")))
}

/// Parses a base URL, making sure relative joins append to its path.
pub fn base_url(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized).map_err(|e| GcbError::Config(format!("Invalid base URL '{raw}': {e}")))
}

pub fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| GcbError::Config(format!("Invalid URL path '{path}': {e}")))
}

/// Fetches a text document; a missing document is `None` rather than an error.
pub async fn get_text(client: &Client, url: Url) -> Result<Option<String>> {
    let response = client.get(url.clone()).send().await?;
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(GcbError::Http {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    Ok(Some(response.text().await?))
}
