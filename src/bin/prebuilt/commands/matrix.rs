//! `prebuilt matrix` command
//!
//! Prints one essential identifier per line, in provisioning order.

use anyhow::Result;

use crate::cli::MatrixArgs;
use crate::commands::{install_options, matrix_for};
use prebuilt::core::{AddonPackage, HostRuntime};
use prebuilt::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: MatrixArgs) -> Result<()> {
    let package = AddonPackage::load(ctx.root())?;
    let opts = install_options(ctx, &package, &args.targets);
    let host = HostRuntime::detect()?;

    let matrix = matrix_for(ctx, &package, &opts, &host)?;
    for tuple in &matrix {
        if ctx.is_verbose() {
            println!("{}  {}", tuple, package.download_url(tuple)?);
        } else {
            println!("{}", tuple);
        }
    }

    Ok(())
}
