//! Test utilities and mocks for unit tests.
//!
//! The network and the native toolchain are the two collaborators tests
//! cannot use for real. [`MockFetcher`] serves a canned archive or an HTTP
//! status, and [`MockCompiler`] writes fake build outputs instead of running
//! node-gyp. Both record how they were called.

pub mod fixtures;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use reqwest::StatusCode;
use url::Url;

use crate::builder::archive::RELEASE_DIR;
use crate::builder::{BuildError, Compiler, ToolchainConfig};
use crate::sources::{FetchError, Fetcher};

pub use fixtures::*;

/// What a [`MockFetcher`] answers.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Copy this file to the destination.
    Archive(PathBuf),
    /// Fail with this HTTP status.
    Status(u16),
}

/// Fetcher that never touches the network.
#[derive(Debug, Clone)]
pub struct MockFetcher {
    response: MockResponse,
    requests: Arc<Mutex<Vec<Url>>>,
}

impl MockFetcher {
    pub fn serving(archive: impl Into<PathBuf>) -> Self {
        Self::new(MockResponse::Archive(archive.into()))
    }

    pub fn status(code: u16) -> Self {
        Self::new(MockResponse::Status(code))
    }

    pub fn not_found() -> Self {
        Self::status(404)
    }

    fn new(response: MockResponse) -> Self {
        MockFetcher {
            response,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<Url> {
        self.requests.lock().unwrap().clone()
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, url: &Url, dest: &Path) -> Result<(), FetchError> {
        self.requests.lock().unwrap().push(url.clone());

        match &self.response {
            MockResponse::Archive(src) => std::fs::copy(src, dest)
                .map(|_| ())
                .map_err(|source| FetchError::Io {
                    path: dest.to_path_buf(),
                    source,
                }),
            MockResponse::Status(code) => Err(FetchError::Status {
                url: url.clone(),
                status: StatusCode::from_u16(*code).unwrap(),
            }),
        }
    }
}

/// Compiler that writes placeholder build outputs.
#[derive(Debug, Clone)]
pub struct MockCompiler {
    root: PathBuf,
    module_name: String,
    library_name: String,
    exit_code: Option<i32>,
    configs: Arc<Mutex<Vec<ToolchainConfig>>>,
}

impl MockCompiler {
    pub fn new(root: impl Into<PathBuf>, module_name: &str, library_name: &str) -> Self {
        MockCompiler {
            root: root.into(),
            module_name: module_name.to_string(),
            library_name: library_name.to_string(),
            exit_code: None,
            configs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail every build with this exit code.
    pub fn failing(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// Configurations compiled so far, in order.
    pub fn configs(&self) -> Vec<ToolchainConfig> {
        self.configs.lock().unwrap().clone()
    }
}

impl Compiler for MockCompiler {
    fn compile(&self, config: &ToolchainConfig) -> Result<(), BuildError> {
        self.configs.lock().unwrap().push(config.clone());

        if let Some(code) = self.exit_code {
            return Err(BuildError::Failed {
                command: "node-gyp configure rebuild".to_string(),
                code: Some(code),
            });
        }

        let release = self.root.join(RELEASE_DIR);
        std::fs::create_dir_all(&release).unwrap();
        std::fs::write(
            release.join(format!("{}.node", self.module_name)),
            format!("{} binary", config.runtime),
        )
        .unwrap();
        std::fs::write(
            release.join(format!(
                "{}.{}",
                self.library_name,
                config.platform.shared_lib_extension()
            )),
            "native library",
        )
        .unwrap();
        Ok(())
    }
}
