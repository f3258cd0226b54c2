//! Toolchain command synthesis for compiling the add-on locally.
//!
//! The add-on is compiled with node-gyp. Which flags it needs depends on the
//! runtime family, its module ABI, the target architecture and the host
//! platform; [`ToolchainConfig::command`] derives them all from one explicit
//! configuration value. Nothing here touches the process environment:
//! variables the build definitions read are handed to the child only.

use std::path::{Path, PathBuf};

use semver::Version;

use crate::core::target::{Arch, Platform, Runtime};

mod gyp;
mod msvs;

pub use gyp::{locate_node_gyp, BuildError, ExitPolicy, NodeGyp};
pub use msvs::MsvsToolset;

/// Header distribution for electron-like runtimes.
pub const ELECTRON_DIST_URL: &str = "https://atom.io/download/electron";

/// First ABI whose V8 supports pointer compression.
const POINTER_COMPRESSION_ABI: u32 = 80;
/// First ABI whose build scripts know `build_v8_with_gn`.
const V8_GN_ABI: u32 = 64;
/// First ABI whose build scripts know `enable_lto`.
const LTO_ABI: u32 = 67;

/// A command to execute, with program, arguments, and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// The program to run
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
    /// Environment variables to set on the child
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Whether an argument is present.
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Look up a child environment variable.
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Everything needed to compile the add-on for one tuple.
#[derive(Debug, Clone)]
pub struct ToolchainConfig {
    pub runtime: Runtime,
    /// Version of the runtime headers to compile against.
    pub target_version: Version,
    pub abi: u32,
    pub arch: Arch,
    /// Platform the toolchain runs on.
    pub platform: Platform,
    /// Prefix of the `gyp_{addon}_*` variables the build definitions read.
    pub addon_name: String,
}

impl ToolchainConfig {
    /// Synthesize the node-gyp invocation for this configuration.
    pub fn command(&self, program: &Path) -> CommandSpec {
        let mut cmd = CommandSpec::new(program).args([
            "configure".to_string(),
            "rebuild".to_string(),
            format!("--target={}", self.target_version),
            format!("--arch={}", self.arch),
        ]);

        if self.runtime.is_electron_like() {
            cmd = cmd.arg(format!("--dist-url={}", ELECTRON_DIST_URL));
        }

        if self.abi >= POINTER_COMPRESSION_ABI {
            if self.arch.is_64bit() {
                cmd = cmd.arg("--v8_enable_pointer_compression=1");
            } else {
                cmd = cmd
                    .arg("--v8_enable_pointer_compression=0")
                    .arg("--v8_enable_31bit_smis_on_64bit_arch=1");
            }
        }

        if self.platform.is_windows() {
            let msvs = MsvsToolset::for_host_major(self.target_version.major);
            cmd = cmd
                .arg(format!("--msvs_version={}", msvs.version))
                .env("msvs_toolset", msvs.toolset.to_string())
                .env("msvs_version", msvs.version.to_string());
        } else {
            if self.abi >= V8_GN_ABI {
                cmd = cmd.arg("--build_v8_with_gn=false");
            }
            if self.abi >= LTO_ABI {
                cmd = cmd.arg("--enable_lto=false");
            }

            let prefix = format!("gyp_{}", self.addon_name);
            cmd = cmd
                .env(format!("{}_runtime", prefix), self.runtime.to_string())
                .env(format!("{}_abi", prefix), self.abi.to_string())
                .env(format!("{}_platform", prefix), self.platform.to_string())
                .env(format!("{}_arch", prefix), self.arch.to_string());
        }

        cmd
    }
}

/// Something that can compile the add-on for a configuration.
pub trait Compiler {
    fn compile(&self, config: &ToolchainConfig) -> Result<(), BuildError>;
}
