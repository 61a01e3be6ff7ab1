//! Schema joined with the statistics observed while rows were staged

use std::sync::Arc;

use super::{Column, Schema, Table};

/// What the staging area learned about one column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnStats {
    /// At least one null value was written
    pub saw_null: bool,
    /// Widest string written, in characters
    pub max_len: usize,
    /// An integer outside the 32-bit range was written
    pub wide_integer: bool,
}

/// Immutable result of finalizing a staging area. Artifact generators only
/// ever see this type, so they cannot run while rows are still arriving.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    schema: Arc<Schema>,
    stats: Vec<Vec<ColumnStats>>,
    rows: Vec<u64>,
}

impl ResolvedSchema {
    pub(crate) fn new(schema: Arc<Schema>, stats: Vec<Vec<ColumnStats>>, rows: Vec<u64>) -> Self {
        Self {
            schema,
            stats,
            rows,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Tables in declared order
    pub fn tables(&self) -> impl DoubleEndedIterator<Item = ResolvedTable<'_>> + '_ {
        self.schema
            .tables()
            .iter()
            .map(move |table| ResolvedTable {
                table,
                stats: &self.stats[table.id().index()],
                rows: self.rows[table.id().index()],
            })
    }
}

/// One table of a [`ResolvedSchema`]
#[derive(Debug, Clone, Copy)]
pub struct ResolvedTable<'a> {
    pub table: &'a Table,
    pub stats: &'a [ColumnStats],
    pub rows: u64,
}

impl<'a> ResolvedTable<'a> {
    /// Columns paired with their statistics
    pub fn columns(&self) -> impl Iterator<Item = (&'a Column, ColumnStats)> + 'a {
        self.table
            .columns()
            .iter()
            .zip(self.stats.iter().copied())
    }
}
