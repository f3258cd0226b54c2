//! Target definitions - what gets provisioned.
//!
//! A [`TargetTuple`] names exactly one downloadable or buildable artifact:
//! the runtime family, its native module ABI, the OS platform and the CPU
//! architecture.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::errors::ConfigError;

/// Runtime families whose names start with `electron` take the electron headers.
static ELECTRON_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^electron").expect("valid regex"));

/// The runtime family a native add-on is built against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Runtime {
    Node,
    Electron,
    /// Any other runtime name, kept verbatim.
    Other(String),
}

impl Runtime {
    pub fn as_str(&self) -> &str {
        match self {
            Runtime::Node => "node",
            Runtime::Electron => "electron",
            Runtime::Other(name) => name,
        }
    }

    /// Whether this runtime builds against the electron header distribution.
    pub fn is_electron_like(&self) -> bool {
        ELECTRON_LIKE.is_match(self.as_str())
    }
}

impl FromStr for Runtime {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(ConfigError::InvalidTarget {
                value: s.to_string(),
                reason: "empty runtime name".to_string(),
            }),
            "node" => Ok(Runtime::Node),
            "electron" => Ok(Runtime::Electron),
            other => Ok(Runtime::Other(other.to_string())),
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating system, named the way Node.js reports `process.platform`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Win32,
    Darwin,
    Linux,
}

impl Platform {
    /// Every platform prebuilds are published for, in publishing order.
    pub const ALL: [Platform; 3] = [Platform::Win32, Platform::Darwin, Platform::Linux];

    /// Detect the platform this binary was compiled for.
    pub fn host() -> Result<Self, ConfigError> {
        std::env::consts::OS.parse()
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Platform::Win32 => "win32",
            Platform::Darwin => "darwin",
            Platform::Linux => "linux",
        }
    }

    pub fn is_windows(&self) -> bool {
        *self == Platform::Win32
    }

    /// Extension of the native shared library shipped next to the add-on.
    pub const fn shared_lib_extension(&self) -> &'static str {
        match self {
            Platform::Win32 => "dll",
            Platform::Darwin => "dylib",
            Platform::Linux => "so",
        }
    }
}

impl FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "win32" | "windows" => Ok(Platform::Win32),
            "darwin" | "macos" => Ok(Platform::Darwin),
            "linux" => Ok(Platform::Linux),
            _ => Err(ConfigError::UnknownPlatform(s.to_string())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture, named the way Node.js reports `process.arch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X64,
    Ia32,
    Arm,
    Arm64,
}

impl Arch {
    /// Architectures expanded by the `all` target keyword.
    pub const PUBLISHED: [Arch; 2] = [Arch::X64, Arch::Ia32];

    /// Detect the architecture this binary was compiled for.
    pub fn host() -> Result<Self, ConfigError> {
        std::env::consts::ARCH.parse()
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::Ia32 => "ia32",
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
        }
    }

    pub const fn is_64bit(&self) -> bool {
        matches!(self, Arch::X64 | Arch::Arm64)
    }
}

impl FromStr for Arch {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x64" | "x86_64" => Ok(Arch::X64),
            "ia32" | "x86" => Ok(Arch::Ia32),
            "arm" => Ok(Arch::Arm),
            "arm64" | "aarch64" => Ok(Arch::Arm64),
            _ => Err(ConfigError::UnknownArch(s.to_string())),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A runtime together with its module ABI, e.g. `electron-80`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuntimeAbi {
    pub runtime: Runtime,
    pub abi: u32,
}

impl RuntimeAbi {
    pub fn new(runtime: Runtime, abi: u32) -> Self {
        RuntimeAbi { runtime, abi }
    }
}

impl FromStr for RuntimeAbi {
    type Err = ConfigError;

    /// Parse a dash-joined pair such as `node-72` or `electron-80`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (runtime, abi) = s.split_once('-').ok_or_else(|| ConfigError::InvalidTarget {
            value: s.to_string(),
            reason: "expected `<runtime>-<abi>`".to_string(),
        })?;

        let abi = abi.parse::<u32>().map_err(|_| ConfigError::InvalidTarget {
            value: s.to_string(),
            reason: format!("`{}` is not a numeric ABI", abi),
        })?;

        Ok(RuntimeAbi {
            runtime: runtime.parse()?,
            abi,
        })
    }
}

impl fmt::Display for RuntimeAbi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.runtime, self.abi)
    }
}

/// One provisioning unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetTuple {
    pub runtime: Runtime,
    pub abi: u32,
    pub platform: Platform,
    pub arch: Arch,
}

impl TargetTuple {
    pub fn new(runtime: Runtime, abi: u32, platform: Platform, arch: Arch) -> Self {
        TargetTuple {
            runtime,
            abi,
            platform,
            arch,
        }
    }

    /// The essential identifier: `{runtime}-v{abi}-{platform}-{arch}`.
    ///
    /// Names the extraction directory under `builds/` and, prefixed with the
    /// package name and version, the archive stem.
    pub fn essential(&self) -> String {
        format!(
            "{}-v{}-{}-{}",
            self.runtime, self.abi, self.platform, self.arch
        )
    }

    /// darwin has no 32-bit x86 builds.
    pub fn is_supported_combination(platform: Platform, arch: Arch) -> bool {
        !(platform == Platform::Darwin && arch == Arch::Ia32)
    }
}

impl fmt::Display for TargetTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.essential())
    }
}
