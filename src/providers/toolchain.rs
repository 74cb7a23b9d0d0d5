use log::{info, warn};
use reqwest::Client;
use url::Url;

use crate::error::{GcbError, Result};
use crate::providers::http;

/// Resolves the cross-build toolchain version a release branch builds with.
///
/// Each upstream branch records it in `build/build-image/cross/VERSION`.
/// Branches that do not exist upstream yet resolve against the baseline branch.
pub struct ToolchainLookup {
    client: Client,
    raw_base: Url,
    upstream_repo: String,
    baseline_branch: String,
}

impl ToolchainLookup {
    pub fn new(raw_base: &str, upstream_repo: &str, baseline_branch: &str) -> Result<Self> {
        Ok(Self {
            client: http::client()?,
            raw_base: http::base_url(raw_base)?,
            upstream_repo: upstream_repo.trim_matches('/').to_string(),
            baseline_branch: baseline_branch.to_string(),
        })
    }

    fn version_url(&self, branch: &str) -> Result<Url> {
        http::join(
            &self.raw_base,
            &format!(
                "{}/{branch}/build/build-image/cross/VERSION",
                self.upstream_repo
            ),
        )
    }

    async fn fetch(&self, branch: &str) -> Result<Option<String>> {
        let Some(body) = http::get_text(&self.client, self.version_url(branch)?).await? else {
            return Ok(None);
        };

        let version = body.trim();
        if version.is_empty() {
            return Err(GcbError::Parse {
                source_name: "cross VERSION file",
                message: format!("empty version for branch {branch}"),
            });
        }
        Ok(Some(version.to_string()))
    }

    pub async fn cross_version(&self, branch: &str) -> Result<String> {
        if let Some(version) = self.fetch(branch).await? {
            info!("Cross version for {branch}: {version}");
            return Ok(version);
        }

        if branch != self.baseline_branch {
            warn!(
                "No cross version published for {branch}, using {}",
                self.baseline_branch
            );
            if let Some(version) = self.fetch(&self.baseline_branch).await? {
                return Ok(version);
            }
        }

        Err(GcbError::Http {
            status: 404,
            url: self.version_url(&self.baseline_branch)?.to_string(),
        })
    }
}
