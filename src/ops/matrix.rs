//! Build matrix resolution.
//!
//! The matrix is the ordered list of tuples one install provisions. It is
//! either the single host tuple or the cross product of configured
//! runtime/ABI pairs, platforms and arches.

use std::path::Path;

use serde::Deserialize;

use crate::core::abi::abi_for;
use crate::core::errors::ConfigError;
use crate::core::host::HostRuntime;
use crate::core::package::AddonPackage;
use crate::core::target::{Arch, Platform, Runtime, RuntimeAbi, TargetTuple};
use crate::util::config::{InstallOptions, TargetSelection};

/// Ordered tuples to provision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildMatrix {
    tuples: Vec<TargetTuple>,
}

impl BuildMatrix {
    /// Cross product of pairs × platforms × arches, pairs outermost.
    ///
    /// Combinations nobody publishes (darwin + ia32) are skipped.
    pub fn expand(pairs: &[RuntimeAbi], platforms: &[Platform], arches: &[Arch]) -> Self {
        let mut tuples = Vec::with_capacity(pairs.len() * platforms.len() * arches.len());
        for pair in pairs {
            for &platform in platforms {
                for &arch in arches {
                    if !TargetTuple::is_supported_combination(platform, arch) {
                        continue;
                    }
                    tuples.push(TargetTuple::new(
                        pair.runtime.clone(),
                        pair.abi,
                        platform,
                        arch,
                    ));
                }
            }
        }
        BuildMatrix { tuples }
    }

    pub fn single(tuple: TargetTuple) -> Self {
        BuildMatrix {
            tuples: vec![tuple],
        }
    }

    pub fn tuples(&self) -> &[TargetTuple] {
        &self.tuples
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TargetTuple> {
        self.tuples.iter()
    }
}

impl<'a> IntoIterator for &'a BuildMatrix {
    type Item = &'a TargetTuple;
    type IntoIter = std::slice::Iter<'a, TargetTuple>;

    fn into_iter(self) -> Self::IntoIter {
        self.tuples.iter()
    }
}

/// Resolve the matrix for an install.
///
/// `electron_dir` is the electron package installed next to the add-on, if
/// any; it switches the host default to an electron tuple.
pub fn resolve_matrix(
    opts: &InstallOptions,
    package: &AddonPackage,
    host: &HostRuntime,
    electron_dir: Option<&Path>,
) -> Result<BuildMatrix, ConfigError> {
    let matrix = match &opts.targets {
        TargetSelection::Host => BuildMatrix::single(host_tuple(host, electron_dir)?),
        TargetSelection::All => {
            let mut pairs: Vec<RuntimeAbi> = Vec::new();
            for target in &package.supported_targets {
                let pair = target.runtime_abi();
                if !pairs.contains(&pair) {
                    pairs.push(pair);
                }
            }
            BuildMatrix::expand(&pairs, &Platform::ALL, &Arch::PUBLISHED)
        }
        TargetSelection::List(targets) => {
            let pairs = targets
                .iter()
                .map(|t| t.parse::<RuntimeAbi>())
                .collect::<Result<Vec<_>, _>>()?;
            let platforms = parse_or(opts.platforms.as_deref(), host.platform)?;
            let arches = parse_or(opts.arches.as_deref(), host.arch)?;
            BuildMatrix::expand(&pairs, &platforms, &arches)
        }
    };

    if matrix.is_empty() {
        return Err(ConfigError::EmptyMatrix);
    }

    tracing::debug!(
        "Resolved {} tuple(s): {}",
        matrix.len(),
        matrix
            .iter()
            .map(TargetTuple::essential)
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(matrix)
}

/// Parse a configured list, or fall back to the host's own value.
fn parse_or<T>(values: Option<&[String]>, host: T) -> Result<Vec<T>, ConfigError>
where
    T: std::str::FromStr<Err = ConfigError>,
{
    match values {
        Some(values) => values.iter().map(|v| v.trim().parse()).collect(),
        None => Ok(vec![host]),
    }
}

#[derive(Deserialize)]
struct ElectronPackage {
    version: String,
}

/// The tuple for the running host.
fn host_tuple(host: &HostRuntime, electron_dir: Option<&Path>) -> Result<TargetTuple, ConfigError> {
    let (runtime, abi) = match electron_dir.filter(|dir| dir.is_dir()) {
        Some(dir) => {
            let version = electron_version(dir)?;
            tracing::debug!("Found electron {} in {}", version, dir.display());
            let abi = abi_for(&Runtime::Electron, &version)?;
            (Runtime::Electron, abi)
        }
        None => (Runtime::Node, host.node()?.abi),
    };

    Ok(TargetTuple::new(runtime, abi, host.platform, host.arch))
}

fn electron_version(dir: &Path) -> Result<String, ConfigError> {
    let path = dir.join("package.json");
    let read = || -> anyhow::Result<String> {
        let contents = std::fs::read_to_string(&path)?;
        let package: ElectronPackage = serde_json::from_str(&contents)?;
        Ok(package.version)
    };

    read().map_err(|source| ConfigError::Manifest {
        path: path.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::host::NodeInfo;
    use semver::Version;
    use tempfile::TempDir;

    fn linux_host() -> HostRuntime {
        HostRuntime::new(
            Platform::Linux,
            Arch::X64,
            Some(NodeInfo {
                version: Version::new(18, 17, 1),
                abi: 108,
            }),
        )
    }

    fn options(targets: TargetSelection) -> InstallOptions {
        InstallOptions {
            targets,
            platforms: None,
            arches: None,
            strict_build_exit: false,
        }
    }

    fn essentials(matrix: &BuildMatrix) -> Vec<String> {
        matrix.iter().map(TargetTuple::essential).collect()
    }

    #[test]
    fn test_host_default_is_node() {
        let package = AddonPackage::new("iohook", "0.9.3");
        let matrix =
            resolve_matrix(&options(TargetSelection::Host), &package, &linux_host(), None).unwrap();

        assert_eq!(essentials(&matrix), vec!["node-v108-linux-x64"]);
    }

    #[test]
    fn test_host_default_prefers_sibling_electron() {
        let tmp = TempDir::new().unwrap();
        let electron = tmp.path().join("electron");
        std::fs::create_dir_all(&electron).unwrap();
        std::fs::write(electron.join("package.json"), r#"{"version": "9.1.0"}"#).unwrap();

        let package = AddonPackage::new("iohook", "0.9.3");
        let matrix = resolve_matrix(
            &options(TargetSelection::Host),
            &package,
            &linux_host(),
            Some(&electron),
        )
        .unwrap();

        assert_eq!(essentials(&matrix), vec!["electron-v80-linux-x64"]);
    }

    #[test]
    fn test_missing_electron_dir_falls_back_to_node() {
        let tmp = TempDir::new().unwrap();
        let package = AddonPackage::new("iohook", "0.9.3");
        let matrix = resolve_matrix(
            &options(TargetSelection::Host),
            &package,
            &linux_host(),
            Some(&tmp.path().join("electron")),
        )
        .unwrap();

        assert_eq!(essentials(&matrix), vec!["node-v108-linux-x64"]);
    }

    #[test]
    fn test_host_default_without_node_is_an_error() {
        let host = HostRuntime::new(Platform::Linux, Arch::X64, None);
        let package = AddonPackage::new("iohook", "0.9.3");

        let err = resolve_matrix(&options(TargetSelection::Host), &package, &host, None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::HostDetection(_)));
    }

    #[test]
    fn test_explicit_targets_cross_product() {
        let mut opts = options(TargetSelection::List(vec![
            "electron-80".to_string(),
            "node-72".to_string(),
        ]));
        opts.platforms = Some(vec!["darwin".to_string(), "win32".to_string()]);
        opts.arches = Some(vec!["x64".to_string(), "ia32".to_string()]);

        let package = AddonPackage::new("iohook", "0.9.3");
        let matrix = resolve_matrix(&opts, &package, &linux_host(), None).unwrap();

        assert_eq!(
            essentials(&matrix),
            vec![
                "electron-v80-darwin-x64",
                "electron-v80-win32-x64",
                "electron-v80-win32-ia32",
                "node-v72-darwin-x64",
                "node-v72-win32-x64",
                "node-v72-win32-ia32",
            ]
        );
    }

    #[test]
    fn test_explicit_targets_default_to_host_platform() {
        let opts = options(TargetSelection::List(vec!["node-64".to_string()]));
        let package = AddonPackage::new("iohook", "0.9.3");
        let host = HostRuntime::new(Platform::Darwin, Arch::Arm64, None);

        let matrix = resolve_matrix(&opts, &package, &host, None).unwrap();
        assert_eq!(essentials(&matrix), vec!["node-v64-darwin-arm64"]);
    }

    #[test]
    fn test_all_expands_supported_targets() {
        let package = AddonPackage::new("iohook", "0.9.3");
        let pairs = package.supported_targets.len();

        let matrix =
            resolve_matrix(&options(TargetSelection::All), &package, &linux_host(), None).unwrap();

        assert_eq!(matrix.len(), pairs * 3 * 2 - pairs);
        assert!(!matrix
            .iter()
            .any(|t| t.platform == Platform::Darwin && t.arch == Arch::Ia32));
        assert_eq!(matrix.tuples()[0].essential(), "electron-v69-win32-x64");
    }

    #[test]
    fn test_all_ignores_platform_overrides() {
        let mut opts = options(TargetSelection::All);
        opts.platforms = Some(vec!["linux".to_string()]);
        let package = AddonPackage::new("iohook", "0.9.3");

        let matrix = resolve_matrix(&opts, &package, &linux_host(), None).unwrap();
        assert!(matrix.iter().any(|t| t.platform == Platform::Win32));
    }

    #[test]
    fn test_malformed_target_is_rejected() {
        let opts = options(TargetSelection::List(vec!["electron80".to_string()]));
        let package = AddonPackage::new("iohook", "0.9.3");

        let err = resolve_matrix(&opts, &package, &linux_host(), None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTarget { .. }));
    }

    #[test]
    fn test_unknown_platform_is_rejected() {
        let mut opts = options(TargetSelection::List(vec!["node-72".to_string()]));
        opts.platforms = Some(vec!["freebsd".to_string()]);
        let package = AddonPackage::new("iohook", "0.9.3");

        let err = resolve_matrix(&opts, &package, &linux_host(), None).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPlatform(p) if p == "freebsd"));
    }

    #[test]
    fn test_only_darwin_ia32_is_empty() {
        let mut opts = options(TargetSelection::List(vec!["node-72".to_string()]));
        opts.platforms = Some(vec!["darwin".to_string()]);
        opts.arches = Some(vec!["ia32".to_string()]);
        let package = AddonPackage::new("iohook", "0.9.3");

        let err = resolve_matrix(&opts, &package, &linux_host(), None).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyMatrix));
    }
}
