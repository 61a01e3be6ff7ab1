//! Tables of a built schema

use super::column::Column;

/// Position of a table in its schema's declared order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub(crate) usize);

impl TableId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A table: ordered columns, the first one being the primary key
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub(crate) id: TableId,
    pub(crate) name: String,
    pub(crate) columns: Vec<Column>,
    pub(crate) rdf_class: Option<String>,
    pub(crate) label: Option<String>,
    pub(crate) comment: Option<String>,
}

impl Table {
    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn primary_key(&self) -> &Column {
        // The builder guarantees a leading primary key
        &self.columns[0]
    }

    /// Foreign key columns with their column index
    pub fn foreign_keys(&self) -> impl Iterator<Item = (usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.references().is_some())
    }

    /// Explicit RDF class, if one was declared
    pub fn rdf_class(&self) -> Option<&str> {
        self.rdf_class.as_deref()
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn comment(&self) -> &str {
        self.comment.as_deref().unwrap_or_else(|| self.label())
    }

    /// Name quoted as a MySQL identifier
    pub fn quoted_name(&self) -> String {
        format!("`{}`", self.name)
    }
}
