//! `prebuilt clean` command

use anyhow::Result;

use crate::cli::CleanArgs;
use prebuilt::core::AddonPackage;
use prebuilt::ops::clean;
use prebuilt::GlobalContext;

pub fn execute(ctx: &GlobalContext, _args: CleanArgs) -> Result<()> {
    let package = AddonPackage::load(ctx.root())?;

    for dir in clean(ctx, &package)? {
        eprintln!("     Removed {}", dir);
    }

    Ok(())
}
