//! Native module ABI tables.
//!
//! Every Node.js and Electron release line ships a `NODE_MODULE_VERSION`.
//! Add-ons compiled against one ABI only load in runtimes with the same ABI,
//! so prebuilds are keyed by it.

use semver::Version;
use serde::Deserialize;

use crate::core::errors::ConfigError;
use crate::core::target::{Runtime, RuntimeAbi};

/// First release of each Node.js line with a new module ABI.
const NODE_ABIS: &[(u64, u64, u32)] = &[
    (8, 0, 57),
    (9, 0, 59),
    (10, 0, 64),
    (11, 0, 67),
    (12, 0, 72),
    (13, 0, 79),
    (14, 0, 83),
    (15, 0, 88),
    (16, 0, 93),
    (17, 0, 102),
    (18, 0, 108),
    (19, 0, 111),
    (20, 0, 115),
    (21, 0, 120),
    (22, 0, 127),
    (23, 0, 131),
];

/// First release of each Electron line with a new module ABI.
const ELECTRON_ABIS: &[(u64, u64, u32)] = &[
    (1, 4, 50),
    (1, 6, 53),
    (1, 7, 54),
    (1, 8, 57),
    (3, 0, 64),
    (4, 0, 69),
    (5, 0, 70),
    (6, 0, 73),
    (7, 0, 75),
    (8, 0, 76),
    (9, 0, 80),
    (10, 0, 82),
    (11, 0, 85),
    (12, 0, 87),
    (13, 0, 89),
    (14, 0, 97),
    (15, 0, 98),
    (16, 0, 99),
    (17, 0, 101),
    (18, 0, 103),
    (19, 0, 106),
    (20, 0, 107),
    (21, 0, 109),
    (22, 0, 110),
    (23, 0, 113),
    (24, 0, 114),
    (25, 0, 116),
    (27, 0, 118),
    (28, 0, 119),
];

/// Look up the module ABI of a runtime release.
///
/// Pre-release tags are ignored, so `9.0.0-beta.3` resolves like `9.0.0`.
/// Release lines newer than the table are unknown, since each new major may
/// bump the ABI.
pub fn abi_for(runtime: &Runtime, version: &str) -> Result<u32, ConfigError> {
    let unknown = || ConfigError::UnknownAbi {
        runtime: runtime.to_string(),
        version: version.to_string(),
    };

    let table = match runtime {
        Runtime::Node => NODE_ABIS,
        Runtime::Electron => ELECTRON_ABIS,
        Runtime::Other(_) => return Err(unknown()),
    };

    let parsed = Version::parse(version.trim_start_matches('v')).map_err(|_| unknown())?;
    let newest_major = table.last().map(|(major, _, _)| *major).unwrap_or(0);
    if parsed.major > newest_major {
        return Err(unknown());
    }

    table
        .iter()
        .rev()
        .find(|(major, minor, _)| (parsed.major, parsed.minor) >= (*major, *minor))
        .map(|(_, _, abi)| *abi)
        .ok_or_else(unknown)
}

/// A runtime release prebuilds are published for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "(String, String, String)")]
pub struct SupportedTarget {
    pub runtime: Runtime,
    pub version: String,
    pub abi: u32,
}

impl SupportedTarget {
    pub fn runtime_abi(&self) -> RuntimeAbi {
        RuntimeAbi::new(self.runtime.clone(), self.abi)
    }
}

impl TryFrom<(String, String, String)> for SupportedTarget {
    type Error = ConfigError;

    fn try_from((runtime, version, abi): (String, String, String)) -> Result<Self, Self::Error> {
        let parsed_abi = abi.parse::<u32>().map_err(|_| ConfigError::InvalidTarget {
            value: format!("{}@{}", runtime, version),
            reason: format!("`{}` is not a numeric ABI", abi),
        })?;

        Ok(SupportedTarget {
            runtime: runtime.parse()?,
            version,
            abi: parsed_abi,
        })
    }
}

/// Releases prebuilds are published for when the package lists none.
pub fn default_supported_targets() -> Vec<SupportedTarget> {
    const DEFAULTS: &[(&str, &str, u32)] = &[
        ("electron", "4.0.4", 69),
        ("electron", "5.0.0", 70),
        ("electron", "6.0.0", 73),
        ("electron", "7.0.0", 75),
        ("electron", "8.0.0", 76),
        ("electron", "9.0.0", 80),
        ("electron", "10.0.0", 82),
        ("electron", "11.0.0", 85),
        ("electron", "12.0.0", 87),
        ("node", "8.9.3", 57),
        ("node", "9.2.0", 59),
        ("node", "10.0.0", 64),
        ("node", "11.0.0", 67),
        ("node", "12.0.0", 72),
        ("node", "13.0.0", 79),
        ("node", "14.0.0", 83),
        ("node", "15.0.0", 88),
    ];

    DEFAULTS
        .iter()
        .map(|(runtime, version, abi)| SupportedTarget {
            runtime: if *runtime == "node" {
                Runtime::Node
            } else {
                Runtime::Electron
            },
            version: version.to_string(),
            abi: *abi,
        })
        .collect()
}
