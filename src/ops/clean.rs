//! Implementation of `prebuilt clean`.

use anyhow::Result;

use crate::builder::build_def;
use crate::core::package::AddonPackage;
use crate::util::context::GlobalContext;
use crate::util::fs::remove_dir_all_if_exists;

/// Remove everything provisioning generates in the add-on root.
///
/// Returns the directories that existed and were removed.
pub fn clean(ctx: &GlobalContext, package: &AddonPackage) -> Result<Vec<String>> {
    let mut removed = Vec::new();

    for dir in [ctx.build_dir(), ctx.prebuilds_dir(), ctx.builds_dir()] {
        if dir.exists() {
            tracing::debug!("Removing {}", dir.display());
            remove_dir_all_if_exists(&dir)?;
            removed.push(dir.display().to_string());
        }
    }

    build_def::deactivate(ctx.root(), &package.library_name)?;
    Ok(removed)
}
