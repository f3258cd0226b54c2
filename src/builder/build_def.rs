//! Per-platform build definitions.
//!
//! The add-on ships one set of gyp files per platform family under
//! `build_def/{variant}/`. node-gyp only reads `binding.gyp` from the
//! package root, so the selected variant is copied there before each build,
//! replacing whatever was active before.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::core::target::Platform;
use crate::util::fs::{copy_file, remove_file_if_exists};

/// The gyp file every variant provides.
pub const BINDING_GYP: &str = "binding.gyp";

/// A platform family's build definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildDefinition {
    Windows,
    Darwin,
    /// Linux and every other unix.
    Linux,
}

impl BuildDefinition {
    /// Select the definition for a platform.
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Win32 => BuildDefinition::Windows,
            Platform::Darwin => BuildDefinition::Darwin,
            Platform::Linux => BuildDefinition::Linux,
        }
    }

    /// Directory name under `build_def/`.
    pub fn variant(&self) -> &'static str {
        match self {
            BuildDefinition::Windows => "win32",
            BuildDefinition::Darwin => "darwin",
            BuildDefinition::Linux => "linux",
        }
    }

    /// The gyp files that make up a definition, relative to its directory.
    pub fn file_names(library_name: &str) -> [String; 2] {
        [BINDING_GYP.to_string(), format!("{}.gyp", library_name)]
    }

    /// Source directory of this variant.
    pub fn source_dir(&self, build_def_dir: &Path) -> PathBuf {
        build_def_dir.join(self.variant())
    }

    /// Make this definition the active one in `root`.
    ///
    /// Previously active gyp files are deleted first, so a missing source
    /// file leaves no stale definition behind.
    pub fn activate(&self, build_def_dir: &Path, root: &Path, library_name: &str) -> Result<Vec<PathBuf>> {
        deactivate(root, library_name)?;

        let source_dir = self.source_dir(build_def_dir);
        let mut activated = Vec::new();
        for name in Self::file_names(library_name) {
            let src = source_dir.join(&name);
            if !src.is_file() {
                bail!(
                    "build definition `{}` is missing {}",
                    self.variant(),
                    src.display()
                );
            }
            let dst = root.join(&name);
            copy_file(&src, &dst)?;
            activated.push(dst);
        }

        tracing::debug!("Activated `{}` build definition", self.variant());
        Ok(activated)
    }
}

/// Delete the active gyp files from `root`, if any.
pub fn deactivate(root: &Path, library_name: &str) -> Result<()> {
    for name in BuildDefinition::file_names(library_name) {
        remove_file_if_exists(&root.join(name))?;
    }
    Ok(())
}
