use std::collections::BTreeMap;
use std::fmt;

use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::{GcbError, Result};
use crate::providers::http;

const MARKER_PREFIX: &str = "release/latest-";

/// A release line such as `release-1.18`, ordered numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReleaseBranch {
    pub major: u32,
    pub minor: u32,
}

impl ReleaseBranch {
    /// Recognizes `release/latest-<major>.<minor>.txt`; other markers are ignored.
    fn from_marker(object_name: &str) -> Option<Self> {
        let version = object_name
            .strip_prefix(MARKER_PREFIX)?
            .strip_suffix(".txt")?;
        let (major, minor) = version.split_once('.')?;
        Some(Self {
            major: major.parse().ok()?,
            minor: minor.parse().ok()?,
        })
    }
}

impl fmt::Display for ReleaseBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "release-{}.{}", self.major, self.minor)
    }
}

#[derive(Deserialize)]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectItem>,
    #[serde(rename = "nextPageToken", default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ObjectItem {
    name: String,
}

/// Reads the per-branch "latest published release" markers from the public release bucket.
pub struct ReleaseRegistry {
    client: Client,
    storage_base: Url,
    bucket: String,
}

impl ReleaseRegistry {
    pub fn new(storage_base: &str, bucket: &str) -> Result<Self> {
        Ok(Self {
            client: http::client()?,
            storage_base: http::base_url(storage_base)?,
            bucket: bucket.to_string(),
        })
    }

    /// Every object name under the marker prefix, following the listing's page tokens.
    async fn marker_names(&self) -> Result<Vec<String>> {
        let listing_url = http::join(
            &self.storage_base,
            &format!("storage/v1/b/{}/o", self.bucket),
        )?;

        let mut names = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = listing_url.clone();
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("prefix", MARKER_PREFIX);
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let body = http::get_text(&self.client, url.clone())
                .await?
                .ok_or_else(|| GcbError::Http {
                    status: 404,
                    url: url.to_string(),
                })?;

            let listing: ObjectList = serde_json::from_str(&body)?;
            names.extend(listing.items.into_iter().map(|item| item.name));

            match listing.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => {
                    debug!("Marker listing continues at page token {token}");
                    page_token = Some(token);
                }
                None => return Ok(names),
            }
        }
    }

    /// Last published version for every release branch, sorted by branch.
    pub async fn latest_per_branch(&self) -> Result<BTreeMap<ReleaseBranch, String>> {
        let mut latest = BTreeMap::new();

        for name in self.marker_names().await? {
            let Some(branch) = ReleaseBranch::from_marker(&name) else {
                debug!("Skipping marker {name}");
                continue;
            };

            let url = http::join(&self.storage_base, &format!("{}/{name}", self.bucket))?;
            match http::get_text(&self.client, url).await? {
                Some(version) => {
                    latest.insert(branch, version.trim().to_string());
                }
                None => warn!("Marker {name} disappeared while reading it"),
            }
        }

        Ok(latest)
    }
}
