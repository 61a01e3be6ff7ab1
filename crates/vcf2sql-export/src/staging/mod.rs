//! Per-table staging of rows
//!
//! The [`StagingArea`] owns one [`StagingStore`] per table inside a
//! run-scoped temporary directory. Every insert is checked before it is
//! written:
//!
//! - the value count matches the table's column count
//! - the key is positive and greater than the table's previous key
//! - each foreign key was already written to its parent table
//! - each value fits its column kind
//!
//! Inserting also updates the per-column statistics that
//! [`StagingArea::resolve`] turns into a [`ResolvedSchema`].

pub mod codec;
mod store;

pub use codec::Value;
pub use store::StagingStore;

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use roaring::RoaringTreemap;
use tempfile::TempDir;
use tracing::{debug, info};
use vcf2sql_common::{ExportError, Result};

use crate::schema::{Column, ColumnKind, ColumnStats, ResolvedSchema, Schema, Table, TableId};

#[derive(Debug)]
struct TableWriter {
    store: StagingStore,
    stats: Vec<ColumnStats>,
    rows: u64,
    last_key: i64,
    /// Keys written so far, kept only for tables that are referenced.
    /// Keys are positive and increasing, so a bitmap over the key space
    /// stays small however many rows are staged.
    keys: Option<RoaringTreemap>,
}

/// Row sinks for every table of a schema
#[derive(Debug)]
pub struct StagingArea {
    schema: Arc<Schema>,
    writers: Vec<TableWriter>,
    dir: TempDir,
    line: String,
}

impl StagingArea {
    /// Open a staging file for every table in a new directory under `tmp_dir`.
    ///
    /// Nothing is left behind if any table fails to open.
    pub fn open(schema: Arc<Schema>, tmp_dir: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("vcf2sql.")
            .tempdir_in(tmp_dir)
            .map_err(|e| {
                ExportError::storage(format!(
                    "cannot create staging directory in {}: {e}",
                    tmp_dir.display()
                ))
            })?;

        let mut writers = Vec::with_capacity(schema.len());
        for table in schema.tables() {
            let store = StagingStore::open(dir.path(), table.name())?;
            writers.push(TableWriter {
                store,
                stats: vec![ColumnStats::default(); table.columns().len()],
                rows: 0,
                last_key: 0,
                keys: schema.is_referenced(table.id()).then(RoaringTreemap::new),
            });
        }

        info!(
            tables = writers.len(),
            dir = %dir.path().display(),
            "Opened staging area"
        );

        Ok(Self {
            schema,
            writers,
            dir,
            line: String::new(),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Directory holding the staged files
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Validate and append one row; returns its key (`values[0]`)
    pub fn insert(&mut self, table: TableId, values: &[Value]) -> Result<i64> {
        let schema = Arc::clone(&self.schema);
        let def = schema.table(table);
        let context = || format!("table '{}'", def.name());

        if values.len() != def.columns().len() {
            return Err(ExportError::ingestion(
                context(),
                format!(
                    "expected {} values, got {}",
                    def.columns().len(),
                    values.len()
                ),
            ));
        }

        let key = self.check_key(def, &values[0])?;
        for (column, value) in def.columns().iter().zip(values).skip(1) {
            self.check_value(def, column, value)?;
        }

        let mut line = std::mem::take(&mut self.line);
        line.clear();
        let writer = &mut self.writers[table.index()];
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                line.push(codec::FIELD_DELIMITER);
            }
            codec::encode_field(value, &mut line);

            let stats = &mut writer.stats[i];
            match value {
                Value::Null => stats.saw_null = true,
                Value::Text(s) => stats.max_len = stats.max_len.max(s.chars().count()),
                Value::Integer(v) => stats.wide_integer |= i32::try_from(*v).is_err(),
                Value::Double(_) => {},
            }
        }
        line.push(codec::LINE_TERMINATOR);
        let written = writer.store.append(&line);
        self.line = line;
        written?;

        writer.rows += 1;
        writer.last_key = key;
        if let Some(keys) = writer.keys.as_mut() {
            // check_key guarantees a positive key
            keys.insert(key.unsigned_abs());
        }
        Ok(key)
    }

    fn check_key(&self, table: &Table, value: &Value) -> Result<i64> {
        let context = || format!("table '{}'", table.name());
        let writer = &self.writers[table.id().index()];
        match value {
            Value::Integer(key) if *key > writer.last_key => Ok(*key),
            Value::Integer(key) if *key <= 0 => Err(ExportError::ingestion(
                context(),
                format!("primary key {key} is not positive"),
            )),
            Value::Integer(key) => Err(ExportError::ingestion(
                context(),
                format!(
                    "primary key {key} does not follow previous key {}",
                    writer.last_key
                ),
            )),
            other => Err(ExportError::ingestion(
                context(),
                format!("primary key must be an integer, got {other:?}"),
            )),
        }
    }

    fn check_value(&self, table: &Table, column: &Column, value: &Value) -> Result<()> {
        let context = || format!("table '{}', column '{}'", table.name(), column.name());
        match (column.kind(), value) {
            (ColumnKind::ForeignKey { references }, Value::Integer(key)) => {
                let parent = &self.writers[references.index()];
                let known = match (parent.keys.as_ref(), u64::try_from(*key)) {
                    (Some(keys), Ok(key)) => keys.contains(key),
                    _ => false,
                };
                if known {
                    Ok(())
                } else {
                    Err(ExportError::ingestion(
                        context(),
                        format!(
                            "foreign key {key} has not been written to table '{}'",
                            self.schema.table(references).name()
                        ),
                    ))
                }
            },
            (ColumnKind::ForeignKey { .. } | ColumnKind::PrimaryKey, Value::Null) => {
                Err(ExportError::ingestion(context(), "key columns cannot be null"))
            },
            (_, Value::Null) => Ok(()),
            (ColumnKind::String, Value::Text(_)) => Ok(()),
            (ColumnKind::Integer, Value::Integer(_)) => Ok(()),
            (ColumnKind::Double, Value::Integer(_)) => Ok(()),
            (ColumnKind::Double, Value::Double(v)) if v.is_finite() => Ok(()),
            (ColumnKind::Double, Value::Double(v)) => Err(ExportError::ingestion(
                context(),
                format!("{v} cannot be loaded as DOUBLE"),
            )),
            (kind, other) => Err(ExportError::ingestion(
                context(),
                format!("{other:?} does not fit a {kind:?} column"),
            )),
        }
    }

    /// Rows written to `table` so far
    pub fn rows(&self, table: TableId) -> u64 {
        self.writers[table.index()].rows
    }

    /// Flush and close every staging file; rows can no longer be added
    pub fn close(&mut self) -> Result<()> {
        for (table, writer) in self.schema.tables().iter().zip(&mut self.writers) {
            writer.store.close()?;
            debug!(
                table = table.name(),
                rows = writer.rows,
                bytes = writer.store.bytes(),
                "Closed staging file"
            );
        }
        Ok(())
    }

    /// Join the collected statistics with the schema.
    ///
    /// Fails unless every staging file has been closed.
    pub fn resolve(&self) -> Result<ResolvedSchema> {
        if let Some((table, _)) = self
            .schema
            .tables()
            .iter()
            .zip(&self.writers)
            .find(|(_, w)| w.store.is_open())
        {
            return Err(ExportError::invalid_state(
                "all staging files closed",
                format!("table '{}' still open", table.name()),
            ));
        }

        Ok(ResolvedSchema::new(
            Arc::clone(&self.schema),
            self.writers.iter().map(|w| w.stats.clone()).collect(),
            self.writers.iter().map(|w| w.rows).collect(),
        ))
    }

    /// Read handle on the closed staging file of `table`
    pub fn staged_file(&self, table: TableId) -> Result<File> {
        self.writers[table.index()].store.reader()
    }

    /// Delete every staging file and the staging directory
    pub fn finalize(self) -> Result<()> {
        for writer in self.writers {
            writer.store.finalize()?;
        }
        let dir = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| {
            ExportError::storage(format!(
                "cannot remove staging directory {}: {e}",
                dir.display()
            ))
        })?;
        debug!(dir = %dir.display(), "Removed staging directory");
        Ok(())
    }
}
