//! node-gyp invocation.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::builder::build_def::BuildDefinition;
use crate::util::process::{find_executable, ProcessBuilder};

use super::{Compiler, ToolchainConfig};

/// Error while compiling the add-on.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("node-gyp not found in {0} or on PATH")]
    ToolchainNotFound(PathBuf),

    #[error("failed to activate build definition")]
    BuildDefinition(#[source] anyhow::Error),

    #[error("failed to run `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to build: `{command}` exited with {}", describe_exit(.code))]
    Failed { command: String, code: Option<i32> },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}

/// How a toolchain exit status maps to success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitPolicy {
    /// Only exit code 1 is a failure. Other nonzero codes and signals pass.
    #[default]
    Compatible,
    /// Anything but exit code 0 is a failure.
    Strict,
}

impl ExitPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            ExitPolicy::Strict
        } else {
            ExitPolicy::Compatible
        }
    }

    /// Whether an exit code (`None` when killed by a signal) counts as success.
    pub fn is_success(&self, code: Option<i32>) -> bool {
        match self {
            ExitPolicy::Compatible => code != Some(1),
            ExitPolicy::Strict => code == Some(0),
        }
    }
}

/// Find node-gyp: the add-on's own `node_modules/.bin` first, then PATH.
pub fn locate_node_gyp(root: &Path) -> Result<PathBuf, BuildError> {
    let name = if cfg!(windows) { "node-gyp.cmd" } else { "node-gyp" };
    let local = root.join("node_modules").join(".bin").join(name);
    if local.is_file() {
        return Ok(local);
    }

    find_executable(name)
        .or_else(|| find_executable("node-gyp"))
        .ok_or_else(|| BuildError::ToolchainNotFound(root.to_path_buf()))
}

/// Compiles the add-on with node-gyp in its root directory.
#[derive(Debug, Clone)]
pub struct NodeGyp {
    /// Located on first compile when unset.
    program: Option<PathBuf>,
    root: PathBuf,
    build_def_dir: PathBuf,
    library_name: String,
    policy: ExitPolicy,
}

impl NodeGyp {
    pub fn new(program: PathBuf, root: PathBuf, library_name: impl Into<String>) -> Self {
        NodeGyp {
            program: Some(program),
            ..Self::for_root(root, library_name)
        }
    }

    /// A compiler for the add-on at `root` that looks for node-gyp only
    /// when it is first needed.
    pub fn for_root(root: PathBuf, library_name: impl Into<String>) -> Self {
        NodeGyp {
            program: None,
            build_def_dir: root.join("build_def"),
            root,
            library_name: library_name.into(),
            policy: ExitPolicy::default(),
        }
    }

    /// Locate node-gyp for the add-on at `root`.
    pub fn discover(root: &Path, library_name: impl Into<String>) -> Result<Self, BuildError> {
        Ok(Self::new(
            locate_node_gyp(root)?,
            root.to_path_buf(),
            library_name,
        ))
    }

    pub fn with_policy(mut self, policy: ExitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_build_def_dir(mut self, dir: PathBuf) -> Self {
        self.build_def_dir = dir;
        self
    }
}

impl Compiler for NodeGyp {
    fn compile(&self, config: &ToolchainConfig) -> Result<(), BuildError> {
        BuildDefinition::for_platform(config.platform)
            .activate(&self.build_def_dir, &self.root, &self.library_name)
            .map_err(BuildError::BuildDefinition)?;

        let program = match &self.program {
            Some(program) => program.clone(),
            None => locate_node_gyp(&self.root)?,
        };
        let spec = config.command(&program);
        let process = ProcessBuilder::new(&spec.program)
            .args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k, v)))
            .cwd(&self.root);
        let command = process.display_command();

        tracing::info!(
            "Compiling {} for {} v{}",
            config.addon_name,
            config.runtime,
            config.target_version
        );
        tracing::debug!("Running `{}`", command);

        let status = process.exec_streaming().map_err(|source| BuildError::Spawn {
            command: command.clone(),
            source,
        })?;

        if self.policy.is_success(status.code()) {
            if !status.success() {
                tracing::warn!(
                    "`{}` exited with {}; treating as success",
                    command,
                    describe_exit(&status.code())
                );
            }
            Ok(())
        } else {
            Err(BuildError::Failed {
                command,
                code: status.code(),
            })
        }
    }
}
