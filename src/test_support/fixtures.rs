//! Test fixtures for common test scenarios.
//!
//! [`AddonFixture`] lays out an add-on root the way a published package
//! looks after `npm install`: a `package.json` plus per-platform build
//! definitions.

use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Builder, Header};

/// Fixture for an add-on package root.
#[derive(Debug, Clone)]
pub struct AddonFixture {
    pub name: String,
    pub version: String,
    pub library_name: String,
}

impl AddonFixture {
    /// The iohook package with its `uiohook` native library.
    pub fn iohook() -> Self {
        AddonFixture {
            name: "iohook".to_string(),
            version: "0.9.3".to_string(),
            library_name: "uiohook".to_string(),
        }
    }

    pub fn package_json(&self) -> String {
        let members = [
            format!("\"name\": \"{}\"", self.name),
            format!("\"version\": \"{}\"", self.version),
            format!(
                "\"binary\": {{ \"library_name\": \"{}\" }}",
                self.library_name
            ),
        ];
        format!("{{\n  {}\n}}\n", members.join(",\n  "))
    }

    /// Write the fixture into `root`.
    pub fn write_to(&self, root: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(root)?;
        std::fs::write(root.join("package.json"), self.package_json())?;

        for variant in ["win32", "darwin", "linux"] {
            let dir = root.join("build_def").join(variant);
            std::fs::create_dir_all(&dir)?;
            std::fs::write(dir.join("binding.gyp"), format!("# {} binding\n", variant))?;
            std::fs::write(
                dir.join(format!("{}.gyp", self.library_name)),
                format!("# {} {}\n", variant, self.library_name),
            )?;
        }

        Ok(root.to_path_buf())
    }
}

/// Write a `.tar.gz` holding `files` (relative path, contents).
pub fn write_prebuild_archive(path: &Path, files: &[(&str, &str)]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut builder = Builder::new(GzEncoder::new(File::create(path)?, Compression::default()));
    for (name, contents) in files {
        let mut header = Header::new_gnu();
        header.set_path(name)?;
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, contents.as_bytes())?;
    }
    builder.into_inner()?.finish()?;
    Ok(())
}
