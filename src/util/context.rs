//! Global context for provisioning operations.
//!
//! Provides centralized access to the add-on root and every path derived
//! from it.
//!
//! ```text
//! {root}/
//!   package.json          add-on metadata
//!   build_def/{variant}/  build definitions per platform
//!   binding.gyp           active build definition (generated)
//!   build/Release/        toolchain output (generated)
//!   prebuilds/            packaging scratch (generated)
//!   builds/{essential}/   installed add-on
//! {tmp}/prebuild.tar.gz   downloaded or freshly packaged archive
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::target::TargetTuple;
use crate::util::config::user_npmrc_path;

/// File name of the archive in the temp directory.
pub const TEMP_ARCHIVE_NAME: &str = "prebuild.tar.gz";

/// Global context containing paths and output settings.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Root directory of the add-on package
    root: PathBuf,

    /// Directory the archive is downloaded or packaged into
    tmp_dir: PathBuf,

    /// Whether to use verbose output
    verbose: bool,
}

impl GlobalContext {
    /// Create a context rooted at the current working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_root(cwd))
    }

    /// Create a context rooted at a specific add-on directory.
    pub fn with_root(root: PathBuf) -> Self {
        GlobalContext {
            root,
            tmp_dir: std::env::temp_dir(),
            verbose: false,
        }
    }

    /// Use a different temp directory.
    pub fn with_tmp_dir(mut self, tmp_dir: PathBuf) -> Self {
        self.tmp_dir = tmp_dir;
        self
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Get the add-on root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Toolchain output tree (`build/`).
    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    /// Packaging scratch directory (`prebuilds/`).
    pub fn prebuilds_dir(&self) -> PathBuf {
        self.root.join("prebuilds")
    }

    /// Install tree (`builds/`).
    pub fn builds_dir(&self) -> PathBuf {
        self.root.join("builds")
    }

    /// Where a tuple's archive is extracted.
    pub fn install_dir(&self, tuple: &TargetTuple) -> PathBuf {
        self.builds_dir().join(tuple.essential())
    }

    /// Directory holding the per-platform build definitions.
    pub fn build_def_dir(&self) -> PathBuf {
        self.root.join("build_def")
    }

    /// Fixed path archives are downloaded or packaged to.
    pub fn temp_archive(&self) -> PathBuf {
        self.tmp_dir.join(TEMP_ARCHIVE_NAME)
    }

    /// npmrc files to read, lowest precedence first.
    ///
    /// The user file comes first, then the nearest `.npmrc` at or above the root.
    pub fn npmrc_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = user_npmrc_path().into_iter().collect();
        if let Some(project) = self
            .root
            .ancestors()
            .map(|dir| dir.join(".npmrc"))
            .find(|p| p.is_file())
        {
            if !files.contains(&project) {
                files.push(project);
            }
        }
        files
    }

    /// The directory `electron` would be installed into next to this add-on.
    pub fn sibling_electron_dir(&self) -> Option<PathBuf> {
        self.root.parent().map(|p| p.join("electron"))
    }
}
