//! `prebuilt flags` command

use std::path::Path;

use anyhow::{Context, Result};
use semver::Version;

use crate::cli::FlagsArgs;
use prebuilt::builder::ToolchainConfig;
use prebuilt::core::{AddonPackage, Arch, HostRuntime, Platform, Runtime};
use prebuilt::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: FlagsArgs) -> Result<()> {
    let package = AddonPackage::load(ctx.root())?;

    let runtime: Runtime = args.runtime.parse()?;
    let arch: Arch = args.arch.parse()?;
    let platform = match args.platform {
        Some(platform) => platform.parse()?,
        None => Platform::host()?,
    };
    let target_version = match args.target {
        Some(version) => Version::parse(version.trim_start_matches('v'))
            .with_context(|| format!("invalid target version `{}`", version))?,
        None => HostRuntime::detect()?.node()?.version.clone(),
    };

    let config = ToolchainConfig {
        runtime,
        target_version,
        abi: args.abi,
        arch,
        platform,
        addon_name: package.name.clone(),
    };
    let cmd = config.command(Path::new("node-gyp"));

    println!(
        "# node-gyp arguments for {}-v{} ({}, {}):",
        config.runtime, config.abi, config.platform, config.arch
    );
    println!("{}", cmd.args.join(" "));

    if !cmd.env.is_empty() {
        println!();
        println!("# Child environment:");
        for (key, value) in &cmd.env {
            println!("{}={}", key, value);
        }
    }

    Ok(())
}
