//! Prebuild sources.
//!
//! A prebuild reaches the install tree in two steps: it is downloaded to a
//! local archive, then that archive is extracted under `builds/`. Locally
//! compiled add-ons skip the first step.

pub mod download;
pub mod extract;

pub use download::{FetchError, Fetcher, HttpFetcher};
pub use extract::{install_archive, InstalledArchive};
