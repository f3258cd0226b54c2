//! Core data types.

pub mod abi;
pub mod errors;
pub mod host;
pub mod package;
pub mod target;

pub use abi::SupportedTarget;
pub use errors::ConfigError;
pub use host::{HostRuntime, NodeInfo};
pub use package::AddonPackage;
pub use target::{Arch, Platform, Runtime, RuntimeAbi, TargetTuple};
