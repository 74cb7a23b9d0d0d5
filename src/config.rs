use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::commands::submit::JobKind;

/// Configuration file structure for gcbmgr.
///
/// Lets an operator pin projects, buckets and tool coordinates instead of
/// passing them on every invocation. Command-line flags and environment
/// variables take precedence over anything set here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Cloud Build submission settings
    #[serde(default)]
    pub gcb: GcbConfig,

    /// Where the submitted job fetches the release tooling from
    #[serde(default)]
    pub tool: ToolConfig,

    /// Upstream project lookups
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GcbConfig {
    /// Cloud project to run builds in; defaults to gcloud's configured project
    pub project: Option<String>,

    /// Project-wide staging bucket
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Prefix of the per-operator bucket used in mock mode
    #[serde(default = "default_mock_bucket_prefix")]
    pub mock_bucket_prefix: String,

    #[serde(default = "default_machine_type")]
    pub machine_type: String,

    #[serde(default = "default_stage_disk_size")]
    pub stage_disk_size: u32,

    #[serde(default = "default_release_disk_size")]
    pub release_disk_size: u32,

    /// Accounts in this domain are tagged by user name alone
    #[serde(default = "default_corporate_domain")]
    pub corporate_domain: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ToolConfig {
    #[serde(default = "default_tool_org")]
    pub org: String,

    #[serde(default = "default_tool_repo")]
    pub repo: String,

    #[serde(default = "default_tool_branch")]
    pub branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpstreamConfig {
    /// Repository whose branches carry the cross-build toolchain version
    #[serde(default = "default_upstream_repo")]
    pub repo: String,

    /// Branch used when a release branch has no version file yet
    #[serde(default = "default_baseline_branch")]
    pub baseline_branch: String,

    #[serde(default = "default_raw_base_url")]
    pub raw_base_url: String,

    #[serde(default = "default_storage_base_url")]
    pub storage_base_url: String,

    /// Public bucket holding the published release markers
    #[serde(default = "default_release_bucket")]
    pub release_bucket: String,
}

impl Default for GcbConfig {
    fn default() -> Self {
        Self {
            project: None,
            bucket: default_bucket(),
            mock_bucket_prefix: default_mock_bucket_prefix(),
            machine_type: default_machine_type(),
            stage_disk_size: default_stage_disk_size(),
            release_disk_size: default_release_disk_size(),
            corporate_domain: default_corporate_domain(),
        }
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            org: default_tool_org(),
            repo: default_tool_repo(),
            branch: default_tool_branch(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            repo: default_upstream_repo(),
            baseline_branch: default_baseline_branch(),
            raw_base_url: default_raw_base_url(),
            storage_base_url: default_storage_base_url(),
            release_bucket: default_release_bucket(),
        }
    }
}

fn default_bucket() -> String {
    "kubernetes-release-gcb".to_string()
}

fn default_mock_bucket_prefix() -> String {
    "kubernetes-release".to_string()
}

fn default_machine_type() -> String {
    "n1-highcpu-32".to_string()
}

fn default_stage_disk_size() -> u32 {
    300
}

fn default_release_disk_size() -> u32 {
    100
}

fn default_corporate_domain() -> String {
    "google.com".to_string()
}

fn default_tool_org() -> String {
    "kubernetes".to_string()
}

fn default_tool_repo() -> String {
    "release".to_string()
}

fn default_tool_branch() -> String {
    "master".to_string()
}

fn default_upstream_repo() -> String {
    "kubernetes/kubernetes".to_string()
}

fn default_baseline_branch() -> String {
    "master".to_string()
}

fn default_raw_base_url() -> String {
    "https://raw.githubusercontent.com/".to_string()
}

fn default_storage_base_url() -> String {
    "https://storage.googleapis.com/".to_string()
}

fn default_release_bucket() -> String {
    "kubernetes-release".to_string()
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./gcbmgr.toml
    /// 3. ./gcbmgr.json
    /// 4. ./gcbmgr.yaml
    /// 5. ./gcbmgr.yml
    ///
    /// Returns default configuration if no file is found. An explicitly
    /// specified path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = ["gcbmgr.toml", "gcbmgr.json", "gcbmgr.yaml", "gcbmgr.yml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub project: Option<String>,
    pub bucket: Option<String>,
    pub mock_bucket_prefix: Option<String>,
    pub disk_size: Option<u32>,
    pub tool_org: Option<String>,
    pub tool_repo: Option<String>,
    pub tool_branch: Option<String>,
    pub nomock: bool,
    pub attended: bool,
}

/// The effective configuration for one invocation.
///
/// Built once at startup and passed by reference to every handler.
#[derive(Debug, Clone)]
pub struct Settings {
    pub project: Option<String>,
    pub bucket: String,
    pub mock_bucket_prefix: String,
    pub machine_type: String,
    pub corporate_domain: String,
    pub nomock: bool,
    pub attended: bool,
    pub tool: ToolConfig,
    pub upstream: UpstreamConfig,
    disk_size_override: Option<u32>,
    stage_disk_size: u32,
    release_disk_size: u32,
}

impl Settings {
    pub fn resolve(config: Config, overrides: Overrides) -> Self {
        let Config {
            gcb,
            tool,
            upstream,
        } = config;

        Self {
            project: overrides.project.or(gcb.project),
            bucket: overrides.bucket.unwrap_or(gcb.bucket),
            mock_bucket_prefix: overrides
                .mock_bucket_prefix
                .unwrap_or(gcb.mock_bucket_prefix),
            machine_type: gcb.machine_type,
            corporate_domain: gcb.corporate_domain,
            nomock: overrides.nomock,
            attended: overrides.attended,
            tool: ToolConfig {
                org: overrides.tool_org.unwrap_or(tool.org),
                repo: overrides.tool_repo.unwrap_or(tool.repo),
                branch: overrides.tool_branch.unwrap_or(tool.branch),
            },
            upstream,
            disk_size_override: overrides.disk_size,
            stage_disk_size: gcb.stage_disk_size,
            release_disk_size: gcb.release_disk_size,
        }
    }

    pub fn disk_size(&self, kind: JobKind) -> u32 {
        self.disk_size_override.unwrap_or(match kind {
            JobKind::Stage => self.stage_disk_size,
            JobKind::Release => self.release_disk_size,
        })
    }

    /// The isolated per-operator bucket mock runs write to.
    pub fn mock_bucket(&self, operator_tag: &str) -> String {
        format!("{}-{operator_tag}", self.mock_bucket_prefix)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::resolve(Config::default(), Overrides::default())
    }
}
