//! Configuration management

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vcf2sql_common::{ExportError, Result};

use crate::artifacts::mapping::{
    MappingOptions, DEFAULT_JDBC_DRIVER, DEFAULT_JDBC_DSN, DEFAULT_JDBC_PASSWORD,
    DEFAULT_JDBC_USER, DEFAULT_RESOURCE_BASE, DEFAULT_VOCABULARY_NS,
};

// ============================================================================
// Export Configuration Constants
// ============================================================================

/// Directory prefix of every member inside the archive.
pub const DEFAULT_ARCHIVE_DIR: &str = "vcf2sql.output/";

/// Default number of records between two progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100_000;

/// Required extension of the output archive.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Archive to create
    pub output: PathBuf,
    /// Parent of the run's staging directory; see [`ExportConfig::staging_dir`]
    pub tmp_dir: Option<PathBuf>,
    pub archive_dir: String,
    pub progress_interval: u64,
    pub mapping: MappingOptions,
}

impl ExportConfig {
    /// Defaults for writing to `output`, without reading the environment
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            tmp_dir: None,
            archive_dir: DEFAULT_ARCHIVE_DIR.to_string(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            mapping: MappingOptions::default(),
        }
    }

    /// Load configuration from `.env`, environment variables and defaults
    pub fn load(output: impl Into<PathBuf>) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(output, |key| std::env::var(key).ok())
    }

    /// Build the configuration from a variable lookup, then validate it
    pub fn from_lookup(
        output: impl Into<PathBuf>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let progress_interval = match var("VCF2SQL_PROGRESS_INTERVAL") {
            Some(s) => s.trim().parse().map_err(|_| {
                ExportError::config(format!(
                    "VCF2SQL_PROGRESS_INTERVAL must be a positive integer, got '{s}'"
                ))
            })?,
            None => DEFAULT_PROGRESS_INTERVAL,
        };

        let config = ExportConfig {
            output: output.into(),
            tmp_dir: var("VCF2SQL_TMP_DIR").map(PathBuf::from),
            archive_dir: var("VCF2SQL_ARCHIVE_DIR").unwrap_or_else(|| DEFAULT_ARCHIVE_DIR.to_string()),
            progress_interval,
            mapping: MappingOptions {
                vocabulary_ns: var("VCF2SQL_VOCABULARY_NS")
                    .unwrap_or_else(|| DEFAULT_VOCABULARY_NS.to_string()),
                resource_base: var("VCF2SQL_RESOURCE_BASE")
                    .unwrap_or_else(|| DEFAULT_RESOURCE_BASE.to_string()),
                jdbc_dsn: var("VCF2SQL_JDBC_DSN").unwrap_or_else(|| DEFAULT_JDBC_DSN.to_string()),
                jdbc_driver: var("VCF2SQL_JDBC_DRIVER")
                    .unwrap_or_else(|| DEFAULT_JDBC_DRIVER.to_string()),
                jdbc_user: var("VCF2SQL_JDBC_USER").unwrap_or_else(|| DEFAULT_JDBC_USER.to_string()),
                jdbc_password: var("VCF2SQL_JDBC_PASSWORD")
                    .unwrap_or_else(|| DEFAULT_JDBC_PASSWORD.to_string()),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let is_zip = self
            .output
            .extension()
            .is_some_and(|ext| ext == ARCHIVE_EXTENSION);
        if !is_zip {
            return Err(ExportError::config(format!(
                "{} must end with '.{ARCHIVE_EXTENSION}'",
                self.output.display()
            )));
        }

        if self.progress_interval == 0 {
            return Err(ExportError::config("progress interval must be greater than 0"));
        }

        // Members must stay inside the archive
        let dir = self.archive_dir.trim_end_matches('/');
        if dir.is_empty()
            || dir.starts_with('/')
            || dir.contains('\\')
            || dir.split('/').any(|part| part.is_empty() || part == "." || part == "..")
        {
            return Err(ExportError::config(format!(
                "archive directory '{}' must be a relative path without '.' or '..'",
                self.archive_dir
            )));
        }

        if self.mapping.vocabulary_ns.is_empty() || self.mapping.resource_base.is_empty() {
            return Err(ExportError::config("mapping namespaces cannot be empty"));
        }

        Ok(())
    }

    /// Where the staging directory is created: the configured temporary
    /// directory, else the directory of the output archive, else the
    /// system temporary directory
    pub fn staging_dir(&self) -> PathBuf {
        if let Some(dir) = &self.tmp_dir {
            return dir.clone();
        }
        match self.output.parent() {
            Some(parent) if parent != Path::new("") => parent.to_path_buf(),
            _ => std::env::temp_dir(),
        }
    }

    /// Archive member name for `file`
    pub fn member_name(&self, file: &str) -> String {
        format!("{}/{file}", self.archive_dir.trim_end_matches('/'))
    }
}
