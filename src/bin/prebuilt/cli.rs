//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// prebuilt - install prebuilt native add-ons, compiling them when needed
#[derive(Parser)]
#[command(name = "prebuilt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Add-on package root (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install the add-on for every configured target
    Install(InstallArgs),

    /// Print the resolved build matrix
    Matrix(MatrixArgs),

    /// Show the node-gyp arguments and environment for a target
    Flags(FlagsArgs),

    /// Remove build outputs and installed prebuilds
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Target selection shared by `install` and `matrix`.
///
/// Each flag overrides the matching `npm_config_*` variable.
#[derive(Args, Clone, Default)]
pub struct TargetArgs {
    /// Comma-separated runtime-abi pairs (e.g. `electron-80,node-72`), or `all`
    #[arg(long, value_name = "LIST")]
    pub targets: Option<String>,

    /// Comma-separated platforms (win32, darwin, linux)
    #[arg(long, value_name = "LIST")]
    pub platforms: Option<String>,

    /// Comma-separated architectures (x64, ia32, arm, arm64)
    #[arg(long, value_name = "LIST")]
    pub arches: Option<String>,
}

#[derive(Args)]
pub struct InstallArgs {
    #[command(flatten)]
    pub targets: TargetArgs,

    /// Base URL release archives are published under
    #[arg(long, value_name = "URL")]
    pub host: Option<String>,

    /// Fail the build on any nonzero node-gyp exit code
    #[arg(long)]
    pub strict_exit: bool,
}

#[derive(Args)]
pub struct MatrixArgs {
    #[command(flatten)]
    pub targets: TargetArgs,
}

#[derive(Args)]
pub struct FlagsArgs {
    /// Runtime family (node, electron)
    #[arg(long)]
    pub runtime: String,

    /// Module ABI
    #[arg(long)]
    pub abi: u32,

    /// Target architecture
    #[arg(long)]
    pub arch: String,

    /// Platform the toolchain runs on (defaults to the host)
    #[arg(long)]
    pub platform: Option<String>,

    /// Runtime version to compile against (defaults to the host node)
    #[arg(long, value_name = "VERSION")]
    pub target: Option<String>,
}

#[derive(Args)]
pub struct CleanArgs {}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
