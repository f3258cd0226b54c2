//! Prebuild installation.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use regex::Regex;
use tar::{Archive, EntryType};

use crate::util::fs::recreate_dir;

/// Entries with this extension are add-on binaries.
static ADDON_BINARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.node$").expect("valid regex"));

/// What an installed archive contained.
#[derive(Debug, Clone)]
pub struct InstalledArchive {
    /// Directory the archive was extracted into
    pub dest: PathBuf,
    /// Relative paths of every extracted file
    pub entries: Vec<PathBuf>,
    /// Relative path of the add-on binary, if the archive had one
    pub binary: Option<PathBuf>,
}

impl InstalledArchive {
    /// File name of the installed add-on binary.
    pub fn binary_name(&self) -> Option<&str> {
        self.binary.as_deref()?.file_name()?.to_str()
    }

    /// Absolute path of the installed add-on binary.
    pub fn binary_path(&self) -> Option<PathBuf> {
        self.binary.as_ref().map(|b| self.dest.join(b))
    }
}

/// Extract a gzip-compressed tarball into `dest`, which is recreated first.
///
/// The last entry named `*.node` is reported as the installed binary. Hard
/// links are materialized as copies when the filesystem cannot link. Entries,
/// link targets and symlink targets that lead outside `dest` fail the install.
pub fn install_archive(archive: &Path, dest: &Path) -> Result<InstalledArchive> {
    let file = File::open(archive)
        .with_context(|| format!("failed to open archive: {}", archive.display()))?;

    recreate_dir(dest)?;
    let root = dest
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", dest.display()))?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));

    let mut installed = InstalledArchive {
        dest: dest.to_path_buf(),
        entries: Vec::new(),
        binary: None,
    };

    for entry in archive.entries().context("failed to read archive entries")? {
        let mut entry = entry.context("failed to read archive entry")?;
        let rel = entry
            .path()
            .context("failed to get entry path")?
            .into_owned();

        if !is_contained(&rel) {
            bail!("archive entry escapes destination directory: {}", rel.display());
        }
        create_parent_within(&root, &rel)?;

        let output_path = root.join(&rel);
        let entry_type = entry.header().entry_type();
        match entry_type {
            EntryType::Directory => {
                unpack_within(&mut entry, &root, &rel)?;
                continue;
            }
            EntryType::Regular | EntryType::Continuous => {
                unpack_within(&mut entry, &root, &rel)?;
            }
            EntryType::Link => {
                let target = entry
                    .link_name()
                    .context("failed to read hard link target")?
                    .map(|t| t.into_owned())
                    .with_context(|| format!("hard link without target: {}", rel.display()))?;
                if !is_contained(&target) {
                    bail!("hard link escapes destination directory: {}", target.display());
                }
                let source = root
                    .join(&target)
                    .canonicalize()
                    .with_context(|| format!("hard link target missing: {}", target.display()))?;
                if !source.starts_with(&root) {
                    bail!("hard link escapes destination directory: {}", target.display());
                }
                if is_symlink(&output_path) {
                    bail!("hard link would replace a symlink: {}", rel.display());
                }
                link_or_copy(&source, &output_path)?;
            }
            EntryType::Symlink => {
                let target = entry
                    .link_name()
                    .context("failed to read symlink")?
                    .map(|t| t.into_owned())
                    .with_context(|| format!("symlink without target: {}", rel.display()))?;
                if !link_stays_within(&rel, &target) {
                    bail!(
                        "symlink escapes destination directory: {} -> {}",
                        rel.display(),
                        target.display()
                    );
                }
                #[cfg(unix)]
                {
                    unpack_within(&mut entry, &root, &rel)?;
                }
                #[cfg(windows)]
                {
                    tracing::debug!("Skipping symlink on Windows: {}", rel.display());
                    continue;
                }
            }
            _ => {
                tracing::debug!(
                    "Skipping unsupported entry type {:?}: {}",
                    entry_type,
                    rel.display()
                );
                continue;
            }
        }

        if ADDON_BINARY.is_match(&rel.to_string_lossy()) {
            installed.binary = Some(rel.clone());
        }
        installed.entries.push(rel);
    }

    tracing::debug!(
        "Extracted {} entries into {}",
        installed.entries.len(),
        dest.display()
    );
    Ok(installed)
}

/// Only plain relative components are allowed in entry paths.
fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Whether a symlink at `rel` pointing at `target` resolves inside the
/// destination, judged on the path text alone.
fn link_stays_within(rel: &Path, target: &Path) -> bool {
    let base = rel.parent().unwrap_or_else(|| Path::new(""));
    let mut depth = 0usize;
    for component in base.join(target).components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// Create the parent directories of `rel` one level at a time, refusing any
/// level that resolves outside `root`.
///
/// `root` must be canonical.
fn create_parent_within(root: &Path, rel: &Path) -> Result<()> {
    let Some(parent) = rel.parent() else {
        return Ok(());
    };

    let mut current = root.to_path_buf();
    for component in parent.components() {
        current.push(component);
        if !current.exists() {
            fs::create_dir(&current)
                .with_context(|| format!("failed to create directory: {}", current.display()))?;
        }
        let resolved = current
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", current.display()))?;
        if !resolved.starts_with(root) {
            bail!("archive entry escapes destination directory: {}", rel.display());
        }
        current = resolved;
    }
    Ok(())
}

/// Unpack through `tar`'s checked path, which refuses writes that would pass
/// through a symlink out of `root`.
fn unpack_within<R: std::io::Read>(
    entry: &mut tar::Entry<'_, R>,
    root: &Path,
    rel: &Path,
) -> Result<()> {
    let unpacked = entry
        .unpack_in(root)
        .with_context(|| format!("failed to extract {}", rel.display()))?;
    if !unpacked {
        bail!("archive entry escapes destination directory: {}", rel.display());
    }
    Ok(())
}

/// Hard-link `src` to `dst`, copying the whole file if linking fails.
fn link_or_copy(src: &Path, dst: &Path) -> Result<()> {
    match fs::hard_link(src, dst) {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::debug!(
                "Hard link {} -> {} failed ({}); copying instead",
                dst.display(),
                src.display(),
                e
            );
            fs::copy(src, dst).with_context(|| {
                format!("failed to copy {} to {}", src.display(), dst.display())
            })?;
            Ok(())
        }
    }
}
