//! prebuilt - native add-on provisioning for Node.js and Electron
//!
//! This crate installs the prebuilt binary of a native add-on for each
//! runtime/ABI/platform/arch tuple it is asked for, and compiles the add-on
//! locally with node-gyp when no prebuild is published.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities and mocks for unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides mock fetchers and compilers plus add-on fixtures.
#[cfg(test)]
pub mod test_support;

pub use self::core::{AddonPackage, HostRuntime, TargetTuple};
pub use ops::{BuildMatrix, Provisioner};
pub use util::context::GlobalContext;
