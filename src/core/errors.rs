//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Error in install configuration, reported before any provisioning starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid target `{value}`: {reason}")]
    InvalidTarget { value: String, reason: String },

    #[error("unknown platform `{0}` (expected win32, darwin or linux)")]
    UnknownPlatform(String),

    #[error("unknown architecture `{0}` (expected x64, ia32, arm or arm64)")]
    UnknownArch(String),

    #[error("no ABI known for {runtime} {version}")]
    UnknownAbi { runtime: String, version: String },

    #[error("failed to read package manifest {path}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("could not detect the host node runtime: {0}")]
    HostDetection(String),

    #[error("the build matrix is empty; check the configured platforms and arches")]
    EmptyMatrix,
}
