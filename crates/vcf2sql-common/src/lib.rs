//! vcf2sql Common Library
//!
//! Shared error handling, logging and checksum utilities for the vcf2sql
//! workspace.
//!
//! # Overview
//!
//! - **Error Handling**: the export error taxonomy and its result alias
//! - **Logging**: tracing subscriber setup driven by environment variables
//! - **Checksums**: digests for produced archives
//!
//! # Example
//!
//! ```no_run
//! use vcf2sql_common::{ExportError, Result};
//! use vcf2sql_common::checksum::compute_file_sha256;
//!
//! fn report(path: &str) -> Result<()> {
//!     let digest = compute_file_sha256(path)?;
//!     println!("{path}: {digest}");
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod checksum;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{ExportError, Result};
