//! Prebuild downloads.
//!
//! A prebuild is fetched over HTTPS into a fixed file in the temp directory.
//! Failures are classified by the transport: an HTTP status is kept as a
//! [`StatusCode`] so callers can tell a missing prebuild (404) apart from a
//! broken network.

use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::util::config::NpmConfig;
use crate::util::fs::remove_file_if_exists;

/// Error while downloading a prebuild.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: HTTP {status}")]
    Status { url: Url, status: StatusCode },

    #[error("failed to download {url}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to write download to {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    /// Whether the server said the prebuild does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Something that can download a URL to a local file.
pub trait Fetcher {
    fn fetch(&self, url: &Url, dest: &Path) -> Result<(), FetchError>;
}

/// Downloads over HTTP(S) with npm's proxy and SSL settings.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    progress: bool,
}

impl HttpFetcher {
    /// Build a fetcher from npm network settings.
    ///
    /// A proxy the HTTP client rejects is dropped with a warning.
    pub fn new(config: &NpmConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder()
            .user_agent(concat!("prebuilt/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(!config.strict_ssl);

        if let Some(proxy) = config.effective_proxy() {
            match reqwest::Proxy::all(proxy) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => tracing::warn!("Ignoring proxy `{}`: {}", proxy, e),
            }
        }

        if !config.strict_ssl {
            tracing::debug!("TLS certificate verification disabled by strict-ssl=false");
        }

        Ok(HttpFetcher {
            client: builder.build().context("failed to build HTTP client")?,
            progress: io::stderr().is_terminal(),
        })
    }

    /// Build a fetcher from an existing client.
    pub fn with_client(client: Client) -> Self {
        HttpFetcher {
            client,
            progress: false,
        }
    }

    fn progress_bar(&self, len: Option<u64>) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        match len {
            Some(len) => {
                let bar = ProgressBar::new(len);
                bar.set_style(
                    ProgressStyle::default_bar()
                        .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("#>-"),
                );
                bar
            }
            None => ProgressBar::new_spinner(),
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url, dest: &Path) -> Result<(), FetchError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status,
            });
        }

        let io_error = |source: io::Error| FetchError::Io {
            path: dest.to_path_buf(),
            source,
        };

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let mut file = File::create(dest).map_err(io_error)?;

        let bar = self.progress_bar(response.content_length());
        bar.set_message("Downloading");
        let mut reader = bar.wrap_read(response);

        if let Err(source) = io::copy(&mut reader, &mut file) {
            bar.abandon();
            drop(file);
            let _ = remove_file_if_exists(dest);
            return Err(io_error(source));
        }

        bar.finish_and_clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use tempfile::TempDir;

    /// Serve a single HTTP response on a local port.
    fn serve_once(status_line: &'static str, body: &'static [u8]) -> (Url, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_line,
                body.len()
            )
            .unwrap();
            stream.write_all(body).unwrap();
        });

        let url = Url::parse(&format!("http://{}/v1.0.0/addon.tar.gz", addr)).unwrap();
        (url, handle)
    }

    fn direct_fetcher() -> HttpFetcher {
        HttpFetcher::with_client(Client::builder().no_proxy().build().unwrap())
    }

    #[test]
    fn test_fetch_success_writes_file() {
        let (url, server) = serve_once("200 OK", b"archive-bytes");
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("prebuild.tar.gz");

        direct_fetcher().fetch(&url, &dest).unwrap();
        server.join().unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"archive-bytes");
    }

    #[test]
    fn test_fetch_404_is_not_found() {
        let (url, server) = serve_once("404 Not Found", b"");
        let tmp = TempDir::new().unwrap();

        let err = direct_fetcher()
            .fetch(&url, &tmp.path().join("prebuild.tar.gz"))
            .unwrap_err();
        server.join().unwrap();

        assert!(err.is_not_found());
        assert!(!tmp.path().join("prebuild.tar.gz").exists());
    }

    #[test]
    fn test_fetch_500_is_not_not_found() {
        let (url, server) = serve_once("500 Internal Server Error", b"");
        let tmp = TempDir::new().unwrap();

        let err = direct_fetcher()
            .fetch(&url, &tmp.path().join("prebuild.tar.gz"))
            .unwrap_err();
        server.join().unwrap();

        assert!(!err.is_not_found());
        assert!(matches!(err, FetchError::Status { status, .. } if status.as_u16() == 500));
    }

    #[test]
    fn test_connection_refused_is_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{}/missing.tar.gz", addr)).unwrap();
        let tmp = TempDir::new().unwrap();
        let err = direct_fetcher()
            .fetch(&url, &tmp.path().join("prebuild.tar.gz"))
            .unwrap_err();

        assert!(matches!(err, FetchError::Transport { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_fetcher_tolerates_bad_proxy() {
        let config = NpmConfig {
            proxy: Some("http://".to_string()),
            https_proxy: None,
            strict_ssl: false,
        };
        assert!(HttpFetcher::new(&config).is_ok());
    }
}
