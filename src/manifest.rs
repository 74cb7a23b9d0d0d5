//! Release manifest schema.
//!
//! A manifest lists the binaries and container images a release publishes
//! and the platforms each one is built for.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMeta {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    #[serde(default)]
    pub binaries: Vec<Binary>,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binary {
    pub name: String,
    #[serde(default)]
    pub platforms: Vec<PlatformType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub name: String,
    #[serde(default)]
    pub platform_type: Vec<String>,
}

/// A file and its checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub name: String,
    pub sha256: String,
}

impl File {
    /// Checksums `contents` as hex-encoded SHA-256.
    pub fn from_contents(name: impl Into<String>, contents: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(contents);
        Self {
            name: name.into(),
            sha256: hex::encode(hasher.finalize()),
        }
    }
}

/// An `os/arch` pair such as `linux/amd64`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformType(pub String);

impl PlatformType {
    pub fn os(&self) -> &str {
        self.0.split_once('/').map_or(self.0.as_str(), |(os, _)| os)
    }

    /// Empty when the platform names no architecture.
    pub fn arch(&self) -> &str {
        self.0.split_once('/').map_or("", |(_, arch)| arch)
    }
}

impl fmt::Display for PlatformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
