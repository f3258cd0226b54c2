//! Add-on package metadata.
//!
//! The add-on being provisioned is described by its own `package.json`:
//! name and version select the release, `supportedTargets` lists the
//! runtimes prebuilds exist for, and the optional `binary` section names the
//! build outputs and the release host.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use url::Url;

use crate::core::abi::{default_supported_targets, SupportedTarget};
use crate::core::errors::ConfigError;
use crate::core::target::TargetTuple;

/// Where release archives are published by default.
pub const DEFAULT_RELEASE_HOST: &str = "https://github.com/intermedia-net/iohook/releases/download";

/// Raw `package.json` fields we care about.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    name: String,
    version: String,
    #[serde(default)]
    supported_targets: Option<Vec<SupportedTarget>>,
    #[serde(default)]
    binary: BinarySection,
}

#[derive(Debug, Default, Deserialize)]
struct BinarySection {
    host: Option<String>,
    module_name: Option<String>,
    library_name: Option<String>,
}

/// The add-on package being provisioned.
#[derive(Debug, Clone)]
pub struct AddonPackage {
    pub name: String,
    pub version: String,
    /// Base URL release archives live under, without a trailing slash.
    pub host: String,
    /// Stem of the add-on binary (`{module_name}.node`).
    pub module_name: String,
    /// Stem of the native shared library the add-on links against.
    pub library_name: String,
    pub supported_targets: Vec<SupportedTarget>,
}

impl AddonPackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        AddonPackage {
            version: version.into(),
            host: DEFAULT_RELEASE_HOST.to_string(),
            module_name: name.clone(),
            library_name: name.clone(),
            supported_targets: default_supported_targets(),
            name,
        }
    }

    /// Load `package.json` from the add-on root.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join("package.json");
        let manifest_error = |source: anyhow::Error| ConfigError::Manifest {
            path: path.clone(),
            source,
        };

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))
            .map_err(manifest_error)?;

        Self::from_json(&contents).map_err(manifest_error)
    }

    /// Parse package metadata from `package.json` contents.
    pub fn from_json(contents: &str) -> anyhow::Result<Self> {
        let raw: PackageJson =
            serde_json::from_str(contents).context("invalid package.json")?;

        let mut package = AddonPackage::new(raw.name, raw.version);
        if let Some(targets) = raw.supported_targets {
            package.supported_targets = targets;
        }
        if let Some(host) = raw.binary.host {
            package = package.with_host(host);
        }
        if let Some(module) = raw.binary.module_name {
            package.module_name = module;
        }
        if let Some(library) = raw.binary.library_name {
            package.library_name = library;
        }

        Ok(package)
    }

    /// Override the release host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into().trim_end_matches('/').to_string();
        self
    }

    /// Archive stem: `{name}-v{version}-{essential}`.
    pub fn archive_stem(&self, tuple: &TargetTuple) -> String {
        format!("{}-v{}-{}", self.name, self.version, tuple.essential())
    }

    /// Remote archive location: `{host}/v{version}/{stem}.tar.gz`.
    pub fn download_url(&self, tuple: &TargetTuple) -> anyhow::Result<Url> {
        let raw = format!(
            "{}/v{}/{}.tar.gz",
            self.host,
            self.version,
            self.archive_stem(tuple)
        );
        Url::parse(&raw).with_context(|| format!("invalid download url `{}`", raw))
    }

    /// File name of the add-on binary.
    pub fn binary_file_name(&self) -> String {
        format!("{}.node", self.module_name)
    }
}
