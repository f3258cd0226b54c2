//! High-level operations.
//!
//! This module contains the implementation of prebuilt commands.

pub mod clean;
pub mod matrix;
pub mod provision;

pub use clean::clean;
pub use matrix::{resolve_matrix, BuildMatrix};
pub use provision::{ProvisionError, ProvisionOutcome, ProvisionReport, Provisioner};
