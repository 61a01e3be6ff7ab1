//! Append-only temporary file holding the staged rows of one table

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;
use vcf2sql_common::{ExportError, Result};

#[derive(Debug)]
enum StoreState {
    Open(BufWriter<NamedTempFile>),
    Closed(NamedTempFile),
    Released,
}

/// Staging sink for one table.
///
/// `close` flushes and stops accepting rows but keeps the file until
/// `finalize` deletes it.
#[derive(Debug)]
pub struct StagingStore {
    table: String,
    path: PathBuf,
    state: StoreState,
    bytes: u64,
}

impl StagingStore {
    /// Create a fresh temporary file for `table` inside `dir`
    pub fn open(dir: &Path, table: &str) -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(&format!("_vcf2sql.{table}."))
            .suffix(".tsv")
            .tempfile_in(dir)
            .map_err(|e| {
                ExportError::storage(format!(
                    "cannot create staging file for table '{table}' in {}: {e}",
                    dir.display()
                ))
            })?;
        let path = file.path().to_path_buf();
        debug!(table, path = %path.display(), "Opened staging file");

        Ok(Self {
            table: table.to_string(),
            path,
            state: StoreState::Open(BufWriter::new(file)),
            bytes: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes appended so far
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, StoreState::Open(_))
    }

    /// Append one encoded row; `line` carries its own terminator
    pub fn append(&mut self, line: &str) -> Result<()> {
        let StoreState::Open(writer) = &mut self.state else {
            return Err(ExportError::storage(format!(
                "staging file for table '{}' is not open",
                self.table
            )));
        };
        writer.write_all(line.as_bytes()).map_err(|e| {
            ExportError::storage(format!(
                "cannot write to staging file for table '{}': {e}",
                self.table
            ))
        })?;
        self.bytes += line.len() as u64;
        Ok(())
    }

    /// Flush and stop accepting rows. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, StoreState::Released) {
            StoreState::Open(writer) => {
                let file = writer.into_inner().map_err(|e| {
                    ExportError::storage(format!(
                        "cannot flush staging file for table '{}': {}",
                        self.table,
                        e.error()
                    ))
                })?;
                self.state = StoreState::Closed(file);
                Ok(())
            },
            other => {
                self.state = other;
                Ok(())
            },
        }
    }

    /// Fresh read handle on the closed file
    pub fn reader(&self) -> Result<File> {
        match &self.state {
            StoreState::Closed(file) => file.reopen().map_err(|e| {
                ExportError::storage(format!(
                    "cannot reopen staging file for table '{}': {e}",
                    self.table
                ))
            }),
            _ => Err(ExportError::storage(format!(
                "staging file for table '{}' must be closed before it is read",
                self.table
            ))),
        }
    }

    /// Delete the temporary file
    pub fn finalize(mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, StoreState::Released) {
            StoreState::Open(writer) => {
                // Unflushed rows are discarded along with the file
                let (file, _) = writer.into_parts();
                file.close()?;
            },
            StoreState::Closed(file) => file.close()?,
            StoreState::Released => {},
        }
        debug!(table = %self.table, "Released staging file");
        Ok(())
    }
}
