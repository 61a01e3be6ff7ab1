//! vcf2sql export library
//!
//! Streams variant records into normalized, linked tables and packages the
//! staged rows together with the SQL needed to load them and a D2RQ
//! mapping of the result.
//!
//! # Layout
//!
//! - [`schema`]: tables, columns and the builder that validates them
//! - [`staging`]: per-table temporary files and the staged row format
//! - [`artifacts`]: `CREATE`/`DROP`/`TRUNCATE`/`LOAD DATA` scripts and the mapping
//! - [`exporter`]: the state machine driving a run end to end
//!
//! # Example
//!
//! ```no_run
//! use vcf2sql_export::config::ExportConfig;
//! use vcf2sql_export::exporter::Exporter;
//! use vcf2sql_export::source::JsonLinesSource;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ExportConfig::load("variants.zip")?;
//!     let mut source = JsonLinesSource::open("variants.jsonl")?;
//!     let summary = Exporter::new(config)?.run(&mut source)?;
//!     println!("{} records -> {}", summary.records, summary.archive.display());
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod archive;
pub mod artifacts;
pub mod config;
pub mod exporter;
pub mod ids;
pub mod loader;
pub mod record;
pub mod schema;
pub mod source;
pub mod staging;
pub mod variant_schema;

pub use exporter::{ExportState, ExportSummary, Exporter};
