//! Local add-on builds.
//!
//! This module compiles the add-on with node-gyp when no prebuild exists
//! and packages the result like a published prebuild.

pub mod archive;
pub mod build_def;
pub mod toolchain;

pub use archive::ArchiveManifest;
pub use build_def::BuildDefinition;
pub use toolchain::{BuildError, CommandSpec, Compiler, ExitPolicy, NodeGyp, ToolchainConfig};
