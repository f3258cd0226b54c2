//! Install configuration.
//!
//! Two kinds of configuration feed an install:
//! - Install options (`targets`, `platforms`, `arches`) from the add-on
//!   section of the consuming project's `package.json` and from the
//!   `npm_config_*` environment npm exports to lifecycle scripts.
//! - npm network settings (`proxy`, `https-proxy`, `strict-ssl`) from the
//!   user and project `.npmrc` files and the environment.
//!
//! Environment values take precedence over files. Problems reading npm
//! network settings are warnings; the defaults (no proxy, strict SSL) apply.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ini::Ini;
use serde::Deserialize;
use url::Url;

/// Environment variable lookup, so tests can supply their own.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Look up a variable in the process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

pub const ENV_TARGETS: &str = "npm_config_targets";
pub const ENV_PLATFORMS: &str = "npm_config_platforms";
pub const ENV_ARCHES: &str = "npm_config_arches";
pub const ENV_STRICT_BUILD_EXIT: &str = "npm_config_strict_build_exit";
pub const ENV_PROXY: &str = "npm_config_proxy";
pub const ENV_HTTPS_PROXY: &str = "npm_config_https_proxy";
pub const ENV_STRICT_SSL: &str = "npm_config_strict_ssl";

/// How far above the add-on root to look for the consuming project.
const MAX_MANIFEST_DEPTH: usize = 4;

/// The add-on section of a consuming project's `package.json`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ManifestOptions {
    pub targets: Vec<String>,
    pub platforms: Option<Vec<String>>,
    pub arches: Option<Vec<String>>,
}

impl ManifestOptions {
    /// Find the nearest ancestor `package.json` of `root` and read its
    /// `section` object.
    ///
    /// The first manifest that parses wins, even without the section.
    pub fn discover(root: &Path, section: &str) -> Self {
        for dir in root.ancestors().skip(1).take(MAX_MANIFEST_DEPTH) {
            let path = dir.join("package.json");
            if !path.is_file() {
                continue;
            }
            match Self::load(&path, section) {
                Ok(opts) => {
                    tracing::debug!("Using install options from {}", path.display());
                    return opts;
                }
                Err(e) => tracing::debug!("Skipping {}: {:#}", path.display(), e),
            }
        }

        tracing::debug!("No project package.json found above {}", root.display());
        Self::default()
    }

    /// Read the `section` object of a `package.json`.
    pub fn load(path: &Path, section: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut json: serde_json::Value = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        match json.get_mut(section).map(serde_json::Value::take) {
            Some(value) => serde_json::from_value(value)
                .with_context(|| format!("invalid `{}` section in {}", section, path.display())),
            None => Ok(Self::default()),
        }
    }
}

/// Which runtime/ABI pairs to provision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelection {
    /// Only the running host.
    Host,
    /// Every supported pair, on every published platform and arch.
    All,
    /// Dash-joined `runtime-abi` pairs, in configuration order.
    List(Vec<String>),
}

/// Merged install options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOptions {
    pub targets: TargetSelection,
    pub platforms: Option<Vec<String>>,
    pub arches: Option<Vec<String>>,
    /// Treat any unsuccessful toolchain exit as a failure.
    pub strict_build_exit: bool,
}

impl InstallOptions {
    /// Merge manifest options with environment overrides.
    pub fn resolve(manifest: ManifestOptions, env: EnvLookup<'_>) -> Self {
        let env_targets = env(ENV_TARGETS);

        let targets = if env_targets.as_deref().map(str::trim) == Some("all") {
            TargetSelection::All
        } else {
            let mut list = manifest.targets;
            list.extend(env_targets.as_deref().map(split_list).unwrap_or_default());
            if list.is_empty() {
                TargetSelection::Host
            } else {
                TargetSelection::List(list)
            }
        };

        InstallOptions {
            targets,
            platforms: env(ENV_PLATFORMS)
                .as_deref()
                .map(split_list)
                .or(manifest.platforms),
            arches: env(ENV_ARCHES).as_deref().map(split_list).or(manifest.arches),
            strict_build_exit: env(ENV_STRICT_BUILD_EXIT)
                .as_deref()
                .is_some_and(parse_bool),
        }
    }
}

/// Split a comma-separated list, dropping empty items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "true" | "1" | "yes")
}

/// npm network settings relevant to downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpmConfig {
    pub proxy: Option<String>,
    pub https_proxy: Option<String>,
    pub strict_ssl: bool,
}

impl Default for NpmConfig {
    fn default() -> Self {
        NpmConfig {
            proxy: None,
            https_proxy: None,
            strict_ssl: true,
        }
    }
}

impl NpmConfig {
    /// Load settings from the given npmrc files (later files win), then the
    /// environment.
    pub fn load(npmrc_files: &[PathBuf], env: EnvLookup<'_>) -> Self {
        let mut config = NpmConfig::default();

        for path in npmrc_files.iter().filter(|p| p.is_file()) {
            match Ini::load_from_file(path) {
                Ok(ini) => {
                    let section = ini.general_section();
                    config.apply(
                        section.get("proxy"),
                        section.get("https-proxy"),
                        section.get("strict-ssl"),
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Error reading npm configuration from {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }

        config.apply(
            env(ENV_PROXY).as_deref(),
            env(ENV_HTTPS_PROXY).as_deref(),
            env(ENV_STRICT_SSL).as_deref(),
        );

        config
    }

    fn apply(&mut self, proxy: Option<&str>, https_proxy: Option<&str>, strict_ssl: Option<&str>) {
        if let Some(proxy) = proxy.and_then(valid_proxy) {
            self.proxy = Some(proxy);
        }
        if let Some(proxy) = https_proxy.and_then(valid_proxy) {
            self.https_proxy = Some(proxy);
        }
        if let Some(strict) = strict_ssl {
            self.strict_ssl = strict.trim() != "false";
        }
    }

    /// The proxy downloads go through; `https-proxy` beats `proxy`.
    pub fn effective_proxy(&self) -> Option<&str> {
        self.https_proxy.as_deref().or(self.proxy.as_deref())
    }
}

/// Accept a proxy setting only if it is a usable URL.
fn valid_proxy(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value == "null" || value == "false" {
        return None;
    }
    match Url::parse(value) {
        Ok(_) => Some(value.to_string()),
        Err(e) => {
            tracing::warn!("Ignoring malformed proxy setting `{}`: {}", value, e);
            None
        }
    }
}

/// The user-level npmrc (`~/.npmrc`).
pub fn user_npmrc_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".npmrc"))
}
