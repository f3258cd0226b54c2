//! Host runtime detection.
//!
//! Platform and architecture come from the compile target of this binary.
//! The Node.js version and module ABI are queried from the `node` executable
//! that runs the install, since locally compiled add-ons must load there.

use semver::Version;

use crate::core::errors::ConfigError;
use crate::core::target::{Arch, Platform};
use crate::util::process::{find_executable, ProcessBuilder};

/// Version and module ABI of the host Node.js.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub version: Version,
    pub abi: u32,
}

impl NodeInfo {
    /// Parse `"<version> <modules>"` as printed by the probe script.
    pub fn parse(output: &str) -> Result<Self, ConfigError> {
        let mut parts = output.split_whitespace();
        let (Some(version), Some(abi)) = (parts.next(), parts.next()) else {
            return Err(ConfigError::HostDetection(format!(
                "unexpected probe output `{}`",
                output.trim()
            )));
        };

        let version = Version::parse(version).map_err(|e| {
            ConfigError::HostDetection(format!("invalid node version `{}`: {}", version, e))
        })?;
        let abi = abi.parse::<u32>().map_err(|_| {
            ConfigError::HostDetection(format!("invalid module ABI `{}`", abi))
        })?;

        Ok(NodeInfo { version, abi })
    }
}

/// The machine and runtime the install runs on.
#[derive(Debug, Clone)]
pub struct HostRuntime {
    pub platform: Platform,
    pub arch: Arch,
    node: Option<NodeInfo>,
}

impl HostRuntime {
    pub fn new(platform: Platform, arch: Arch, node: Option<NodeInfo>) -> Self {
        HostRuntime {
            platform,
            arch,
            node,
        }
    }

    /// Detect the host. A missing `node` is not an error until its version is needed.
    pub fn detect() -> Result<Self, ConfigError> {
        let node = match probe_node() {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::debug!("node probe failed: {}", e);
                None
            }
        };

        Ok(HostRuntime {
            platform: Platform::host()?,
            arch: Arch::host()?,
            node,
        })
    }

    /// The host Node.js, required for ABI defaults and local builds.
    pub fn node(&self) -> Result<&NodeInfo, ConfigError> {
        self.node.as_ref().ok_or_else(|| {
            ConfigError::HostDetection(
                "`node` was not found; set npm_node_execpath or add node to PATH".to_string(),
            )
        })
    }
}

/// Ask the host `node` for its version and module ABI.
///
/// npm exports `npm_node_execpath` to lifecycle scripts; otherwise `node`
/// is looked up on PATH.
fn probe_node() -> Result<NodeInfo, ConfigError> {
    let node = std::env::var_os("npm_node_execpath")
        .map(Into::into)
        .or_else(|| find_executable("node"))
        .ok_or_else(|| ConfigError::HostDetection("`node` not found on PATH".to_string()))?;

    let output = ProcessBuilder::new(&node)
        .args(["-p", "process.versions.node + ' ' + process.versions.modules"])
        .exec_and_check()
        .map_err(|e| ConfigError::HostDetection(format!("{:#}", e)))?;

    NodeInfo::parse(&String::from_utf8_lossy(&output.stdout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        let info = NodeInfo::parse("18.17.1 108\n").unwrap();
        assert_eq!(info.version, Version::new(18, 17, 1));
        assert_eq!(info.abi, 108);
    }

    #[test]
    fn test_parse_probe_output_errors() {
        assert!(NodeInfo::parse("").is_err());
        assert!(NodeInfo::parse("18.17.1").is_err());
        assert!(NodeInfo::parse("eighteen 108").is_err());
        assert!(NodeInfo::parse("18.17.1 abc").is_err());
    }

    #[test]
    fn test_missing_node_errors_lazily() {
        let host = HostRuntime::new(Platform::Linux, Arch::X64, None);
        assert_eq!(host.platform, Platform::Linux);
        assert!(host.node().is_err());
    }
}
