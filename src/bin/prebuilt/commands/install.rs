//! `prebuilt install` command

use anyhow::Result;

use crate::cli::InstallArgs;
use crate::commands::{install_options, matrix_for};
use prebuilt::builder::{ExitPolicy, NodeGyp};
use prebuilt::core::{AddonPackage, HostRuntime};
use prebuilt::ops::{ProvisionOutcome, Provisioner};
use prebuilt::sources::HttpFetcher;
use prebuilt::util::config::{process_env, NpmConfig};
use prebuilt::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: InstallArgs) -> Result<()> {
    let mut package = AddonPackage::load(ctx.root())?;
    if let Some(host) = args.host {
        package = package.with_host(host);
    }

    let mut opts = install_options(ctx, &package, &args.targets);
    opts.strict_build_exit |= args.strict_exit;

    let host = HostRuntime::detect()?;
    let matrix = matrix_for(ctx, &package, &opts, &host)?;

    let npm = NpmConfig::load(&ctx.npmrc_files(), &process_env);
    let fetcher = HttpFetcher::new(&npm)?;
    let compiler = NodeGyp::for_root(ctx.root().to_path_buf(), package.library_name.clone())
        .with_build_def_dir(ctx.build_def_dir())
        .with_policy(ExitPolicy::from_strict(opts.strict_build_exit));

    let provisioner = Provisioner::new(ctx, &package, &host, &fetcher, &compiler);
    provisioner.provision_matrix(&matrix, |report| {
        let how = match report.outcome {
            ProvisionOutcome::FetchedRemote => "prebuild",
            ProvisionOutcome::CompiledLocally => "local build",
        };
        eprintln!(
            "   Installed {} ({}) into {}",
            report.tuple,
            how,
            report.install_dir.display()
        );
    })?;

    Ok(())
}
