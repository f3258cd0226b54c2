//! Packaging of freshly built add-ons.
//!
//! A local build leaves the add-on binary and its native library under
//! `build/Release/`. Those two files are packed into a gzipped tarball with
//! the same layout a published prebuild has, so installing a local build and
//! installing a download are the same operation.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use tar::Builder;

use crate::core::package::AddonPackage;
use crate::core::target::Platform;
use crate::util::fs::ensure_dir;

/// Directory node-gyp writes release builds to, relative to the root.
pub const RELEASE_DIR: &str = "build/Release";

/// The files a build must produce before it can be packaged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveManifest {
    files: Vec<PathBuf>,
}

impl ArchiveManifest {
    /// The add-on binary plus the platform's native library.
    pub fn for_platform(platform: Platform, package: &AddonPackage) -> Self {
        let release = Path::new(RELEASE_DIR);
        ArchiveManifest {
            files: vec![
                release.join(package.binary_file_name()),
                release.join(format!(
                    "{}.{}",
                    package.library_name,
                    platform.shared_lib_extension()
                )),
            ],
        }
    }

    /// Relative paths, in archive order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Manifest entries that do not exist under `root`.
    pub fn missing(&self, root: &Path) -> Vec<&Path> {
        self.files
            .iter()
            .filter(|f| !root.join(f).is_file())
            .map(PathBuf::as_path)
            .collect()
    }

    /// Pack the manifest's files under `root` into a `.tar.gz` at `dest`.
    ///
    /// Entries keep their manifest-relative names. The destination's
    /// directory is created if absent.
    pub fn pack(&self, root: &Path, dest: &Path) -> Result<PathBuf> {
        let missing = self.missing(root);
        if !missing.is_empty() {
            bail!(
                "build output is incomplete; missing {}",
                missing
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        if let Some(parent) = dest.parent() {
            ensure_dir(parent)?;
        }

        let file = File::create(dest)
            .with_context(|| format!("failed to create archive: {}", dest.display()))?;
        let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));

        for rel in &self.files {
            builder
                .append_path_with_name(root.join(rel), rel)
                .with_context(|| format!("failed to add {} to archive", rel.display()))?;
        }

        builder
            .into_inner()
            .and_then(|encoder| encoder.finish())
            .with_context(|| format!("failed to finish archive: {}", dest.display()))?;

        tracing::debug!("Packed {} files into {}", self.files.len(), dest.display());
        Ok(dest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn iohook() -> AddonPackage {
        let mut package = AddonPackage::new("iohook", "0.9.3");
        package.library_name = "uiohook".to_string();
        package
    }

    #[test]
    fn test_manifest_per_platform() {
        let expected = [
            (Platform::Win32, "uiohook.dll"),
            (Platform::Linux, "uiohook.so"),
            (Platform::Darwin, "uiohook.dylib"),
        ];

        for (platform, library) in expected {
            let manifest = ArchiveManifest::for_platform(platform, &iohook());
            assert_eq!(
                manifest.files(),
                &[
                    PathBuf::from("build/Release/iohook.node"),
                    PathBuf::from("build/Release").join(library),
                ]
            );
        }
    }

    #[test]
    fn test_pack_requires_all_files() {
        let tmp = TempDir::new().unwrap();
        let release = tmp.path().join(RELEASE_DIR);
        std::fs::create_dir_all(&release).unwrap();
        std::fs::write(release.join("iohook.node"), "binary").unwrap();

        let manifest = ArchiveManifest::for_platform(Platform::Linux, &iohook());
        let err = manifest
            .pack(tmp.path(), &tmp.path().join("out/prebuild.tar.gz"))
            .unwrap_err();

        assert!(err.to_string().contains("uiohook.so"));
    }

    #[test]
    fn test_pack_creates_destination_dir() {
        let tmp = TempDir::new().unwrap();
        let release = tmp.path().join(RELEASE_DIR);
        std::fs::create_dir_all(&release).unwrap();
        std::fs::write(release.join("iohook.node"), "binary").unwrap();
        std::fs::write(release.join("uiohook.dylib"), "library").unwrap();

        let dest = tmp.path().join("prebuilds/nested/prebuild.tar.gz");
        let manifest = ArchiveManifest::for_platform(Platform::Darwin, &iohook());
        manifest.pack(tmp.path(), &dest).unwrap();

        let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(File::open(&dest).unwrap()));
        let names: Vec<PathBuf> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().into_owned())
            .collect();
        assert_eq!(names, manifest.files());
    }

    #[test]
    fn test_packed_build_installs_identically() {
        let tmp = TempDir::new().unwrap();
        let release = tmp.path().join(RELEASE_DIR);
        std::fs::create_dir_all(&release).unwrap();
        std::fs::write(release.join("iohook.node"), "binary").unwrap();
        std::fs::write(release.join("uiohook.dll"), "library").unwrap();

        let manifest = ArchiveManifest::for_platform(Platform::Win32, &iohook());
        let packed = manifest
            .pack(tmp.path(), &tmp.path().join("tmp/prebuild.tar.gz"))
            .unwrap();

        let dest = tmp.path().join("builds/node-v72-win32-x64");
        let installed = crate::sources::install_archive(&packed, &dest).unwrap();

        assert_eq!(installed.entries, manifest.files());
        assert_eq!(
            installed.binary.as_deref(),
            Some(Path::new("build/Release/iohook.node"))
        );
        for rel in manifest.files() {
            assert_eq!(
                std::fs::read(dest.join(rel)).unwrap(),
                std::fs::read(tmp.path().join(rel)).unwrap()
            );
        }
    }
}
