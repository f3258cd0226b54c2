//! Download-or-compile provisioning.
//!
//! Each tuple of the matrix is provisioned on its own:
//!
//! 1. Download `{host}/v{version}/{name}-v{version}-{essential}.tar.gz` to the
//!    temp archive.
//! 2. On a 404, compile with node-gyp against the host's Node.js, pack the
//!    build outputs into the temp archive and drop `build/` and `prebuilds/`.
//! 3. Recreate `builds/` and extract the archive into `builds/{essential}`.
//!
//! Any other failure aborts the whole run.

use std::path::PathBuf;

use thiserror::Error;

use crate::builder::{ArchiveManifest, BuildError, Compiler, ToolchainConfig};
use crate::core::errors::ConfigError;
use crate::core::host::HostRuntime;
use crate::core::package::AddonPackage;
use crate::core::target::TargetTuple;
use crate::ops::matrix::BuildMatrix;
use crate::sources::{install_archive, FetchError, Fetcher};
use crate::util::context::GlobalContext;
use crate::util::fs::{recreate_dir, remove_dir_all_if_exists};

/// Error that aborts provisioning.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("invalid download url for {tuple}")]
    Url {
        tuple: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to package local build for {tuple}")]
    Package {
        tuple: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to install prebuild for {tuple}")]
    Install {
        tuple: String,
        #[source]
        source: anyhow::Error,
    },
}

/// How a tuple's archive was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    FetchedRemote,
    CompiledLocally,
}

/// Result of provisioning one tuple.
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub tuple: TargetTuple,
    pub outcome: ProvisionOutcome,
    /// `builds/{essential}`
    pub install_dir: PathBuf,
    /// File name of the installed add-on binary, if the archive had one.
    pub binary: Option<String>,
}

/// Provisions tuples for one add-on.
pub struct Provisioner<'a, F: ?Sized, C: ?Sized> {
    ctx: &'a GlobalContext,
    package: &'a AddonPackage,
    host: &'a HostRuntime,
    fetcher: &'a F,
    compiler: &'a C,
}

impl<'a, F, C> Provisioner<'a, F, C>
where
    F: Fetcher + ?Sized,
    C: Compiler + ?Sized,
{
    pub fn new(
        ctx: &'a GlobalContext,
        package: &'a AddonPackage,
        host: &'a HostRuntime,
        fetcher: &'a F,
        compiler: &'a C,
    ) -> Self {
        Provisioner {
            ctx,
            package,
            host,
            fetcher,
            compiler,
        }
    }

    /// Provision every tuple in order, reporting each as it completes.
    ///
    /// Stops at the first error; tuples already installed stay installed.
    pub fn provision_matrix(
        &self,
        matrix: &BuildMatrix,
        mut on_complete: impl FnMut(&ProvisionReport),
    ) -> Result<Vec<ProvisionReport>, ProvisionError> {
        let mut reports = Vec::with_capacity(matrix.len());
        for tuple in matrix {
            let report = self.provision(tuple)?;
            on_complete(&report);
            reports.push(report);
        }
        Ok(reports)
    }

    /// Provision a single tuple.
    pub fn provision(&self, tuple: &TargetTuple) -> Result<ProvisionReport, ProvisionError> {
        let stem = self.package.archive_stem(tuple);
        let url = self
            .package
            .download_url(tuple)
            .map_err(|source| ProvisionError::Url {
                tuple: tuple.essential(),
                source,
            })?;
        let archive = self.ctx.temp_archive();

        tracing::info!("Downloading prebuild for platform: {}", stem);
        tracing::debug!("{} -> {}", url, archive.display());

        let outcome = match self.fetcher.fetch(&url, &archive) {
            Ok(()) => ProvisionOutcome::FetchedRemote,
            Err(e) if e.is_not_found() => {
                tracing::warn!("Prebuild for current platform ({}) not found!", stem);
                tracing::warn!("Trying to compile for your platform.");
                self.build_locally(tuple)?;
                ProvisionOutcome::CompiledLocally
            }
            Err(e) => return Err(e.into()),
        };

        let install_error = |source: anyhow::Error| ProvisionError::Install {
            tuple: tuple.essential(),
            source,
        };

        let install_dir = self.ctx.install_dir(tuple);
        recreate_dir(&self.ctx.builds_dir()).map_err(install_error)?;
        let installed = install_archive(&archive, &install_dir).map_err(install_error)?;

        let binary = installed.binary_name().map(str::to_string);
        match &binary {
            Some(name) => tracing::info!("Installed {} into {}", name, install_dir.display()),
            None => tracing::warn!(
                "Archive for {} contained no .node binary",
                tuple.essential()
            ),
        }

        Ok(ProvisionReport {
            tuple: tuple.clone(),
            outcome,
            install_dir,
            binary,
        })
    }

    /// Compile for `tuple` against the host Node.js and pack the outputs into
    /// the temp archive.
    fn build_locally(&self, tuple: &TargetTuple) -> Result<(), ProvisionError> {
        let node = self.host.node()?;
        let config = ToolchainConfig {
            runtime: tuple.runtime.clone(),
            target_version: node.version.clone(),
            abi: tuple.abi,
            arch: tuple.arch,
            platform: self.host.platform,
            addon_name: self.package.name.clone(),
        };

        self.compiler.compile(&config)?;

        let package_error = |source: anyhow::Error| ProvisionError::Package {
            tuple: tuple.essential(),
            source,
        };

        // Outputs are named for the platform that built them.
        ArchiveManifest::for_platform(self.host.platform, self.package)
            .pack(self.ctx.root(), &self.ctx.temp_archive())
            .map_err(package_error)?;

        remove_dir_all_if_exists(&self.ctx.build_dir()).map_err(package_error)?;
        remove_dir_all_if_exists(&self.ctx.prebuilds_dir()).map_err(package_error)?;
        Ok(())
    }
}
