//! Relational schema model
//!
//! A [`Schema`] is an ordered list of [`Table`]s assembled by a
//! [`SchemaBuilder`]. Once built it never changes: the statistics the DDL
//! needs (observed nulls, widest string) are collected by the staging area
//! and joined back in as a [`ResolvedSchema`] after the last row is written.
//!
//! Because a foreign key may only target a table that was built before it,
//! declared order is also a valid dependency order: parents come first.

mod builder;
mod column;
mod resolved;
mod table;

pub use builder::{SchemaBuilder, TableBuilder};
pub use column::{Column, ColumnKind, ColumnSpec, ScalarType};
pub use resolved::{ColumnStats, ResolvedSchema, ResolvedTable};
pub use table::{Table, TableId};

/// An immutable, ordered set of tables with unique names
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    tables: Vec<Table>,
}

impl Schema {
    pub(crate) fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    /// Tables in declared order
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, id: TableId) -> &Table {
        &self.tables[id.index()]
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name() == name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Whether any foreign key in the schema targets `id`
    pub fn is_referenced(&self, id: TableId) -> bool {
        self.tables
            .iter()
            .flat_map(|t| t.columns())
            .any(|c| c.references() == Some(id))
    }
}
