//! Command implementations

pub mod clean;
pub mod completions;
pub mod flags;
pub mod install;
pub mod matrix;

use anyhow::Result;

use crate::cli::TargetArgs;
use prebuilt::core::{AddonPackage, HostRuntime};
use prebuilt::ops::{resolve_matrix, BuildMatrix};
use prebuilt::util::config::{
    process_env, InstallOptions, ManifestOptions, ENV_ARCHES, ENV_PLATFORMS, ENV_TARGETS,
};
use prebuilt::GlobalContext;

/// Merge install options: CLI flags, then the environment, then the
/// consuming project's manifest.
pub fn install_options(ctx: &GlobalContext, package: &AddonPackage, args: &TargetArgs) -> InstallOptions {
    let lookup = |key: &str| {
        let flag = match key {
            ENV_TARGETS => args.targets.clone(),
            ENV_PLATFORMS => args.platforms.clone(),
            ENV_ARCHES => args.arches.clone(),
            _ => None,
        };
        flag.or_else(|| process_env(key))
    };

    let manifest = ManifestOptions::discover(ctx.root(), &package.name);
    InstallOptions::resolve(manifest, &lookup)
}

/// Resolve the matrix for the add-on at the context root.
pub fn matrix_for(
    ctx: &GlobalContext,
    package: &AddonPackage,
    opts: &InstallOptions,
    host: &HostRuntime,
) -> Result<BuildMatrix> {
    let electron_dir = ctx.sibling_electron_dir();
    Ok(resolve_matrix(opts, package, host, electron_dir.as_deref())?)
}
