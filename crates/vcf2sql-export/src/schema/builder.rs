//! Declarative schema construction
//!
//! ```
//! use vcf2sql_export::schema::{ColumnSpec, SchemaBuilder};
//!
//! # fn main() -> vcf2sql_common::Result<()> {
//! let mut builder = SchemaBuilder::new();
//! builder
//!     .table("sample")
//!     .column(ColumnSpec::primary_key())
//!     .column(ColumnSpec::string("name"))
//!     .build()?;
//! builder
//!     .table("genotype")
//!     .column(ColumnSpec::primary_key())
//!     .column(ColumnSpec::foreign_key("sample"))
//!     .column(ColumnSpec::integer("dp"))
//!     .build()?;
//! let schema = builder.finish()?;
//! assert_eq!(schema.len(), 2);
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet};

use vcf2sql_common::{ExportError, Result};

use super::column::{Column, ColumnKind, ColumnSpec, ScalarType, SpecKind};
use super::table::{Table, TableId};
use super::Schema;

/// Collects tables in declared order and validates each one as it is built
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    tables: Vec<Table>,
    by_name: HashMap<String, TableId>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start declaring a table. Nothing is recorded until
    /// [`TableBuilder::build`] succeeds.
    pub fn table(&mut self, name: impl Into<String>) -> TableBuilder<'_> {
        TableBuilder {
            schema: self,
            name: name.into(),
            columns: Vec::new(),
            rdf_class: None,
            label: None,
            comment: None,
        }
    }

    /// Id of an already built table
    pub fn lookup(&self, name: &str) -> Option<TableId> {
        self.by_name.get(name).copied()
    }

    pub fn finish(self) -> Result<Schema> {
        if self.tables.is_empty() {
            return Err(ExportError::schema("schema declares no tables"));
        }
        Ok(Schema::new(self.tables))
    }
}

/// Declaration of a single table, borrowed from its [`SchemaBuilder`]
#[derive(Debug)]
pub struct TableBuilder<'a> {
    schema: &'a mut SchemaBuilder,
    name: String,
    columns: Vec<ColumnSpec>,
    rdf_class: Option<String>,
    label: Option<String>,
    comment: Option<String>,
}

impl TableBuilder<'_> {
    pub fn column(mut self, spec: ColumnSpec) -> Self {
        self.columns.push(spec);
        self
    }

    pub fn columns(mut self, specs: impl IntoIterator<Item = ColumnSpec>) -> Self {
        self.columns.extend(specs);
        self
    }

    /// RDF class of the rows, e.g. `foaf:Person`
    pub fn rdf_class(mut self, class: impl Into<String>) -> Self {
        self.rdf_class = Some(class.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Validate the declaration and append the table to the schema
    pub fn build(self) -> Result<TableId> {
        let TableBuilder {
            schema,
            name,
            columns: specs,
            rdf_class,
            label,
            comment,
        } = self;

        validate_identifier(&name).map_err(|msg| ExportError::schema(format!("table {msg}")))?;
        if schema.by_name.contains_key(&name) {
            return Err(ExportError::schema(format!("table '{name}' is declared twice")));
        }

        let mut columns = Vec::with_capacity(specs.len());
        let mut seen = HashSet::new();
        for spec in specs {
            let column = resolve_column(schema, spec)
                .map_err(|e| in_table(&name, e))?;
            if !seen.insert(column.name.clone()) {
                return Err(ExportError::schema(format!(
                    "table '{name}': column '{}' is declared twice",
                    column.name
                )));
            }
            columns.push(column);
        }

        match columns.first() {
            None => {
                return Err(ExportError::schema(format!("table '{name}' has no columns")));
            },
            Some(first) if !first.is_primary_key() => {
                return Err(ExportError::schema(format!(
                    "table '{name}': first column '{}' must be the primary key",
                    first.name
                )));
            },
            Some(_) => {},
        }
        if columns.iter().filter(|c| c.is_primary_key()).count() > 1 {
            return Err(ExportError::schema(format!(
                "table '{name}' declares more than one primary key"
            )));
        }

        let id = TableId(schema.tables.len());
        schema.by_name.insert(name.clone(), id);
        schema.tables.push(Table {
            id,
            name,
            columns,
            rdf_class,
            label,
            comment,
        });
        Ok(id)
    }
}

fn resolve_column(schema: &SchemaBuilder, spec: ColumnSpec) -> Result<Column> {
    let (kind, default_name) = match &spec.kind {
        SpecKind::PrimaryKey => (ColumnKind::PrimaryKey, None),
        SpecKind::ForeignKey(target) => {
            let references = schema.lookup(target).ok_or_else(|| {
                ExportError::schema(format!(
                    "foreign key targets table '{target}', which has not been built yet"
                ))
            })?;
            (ColumnKind::ForeignKey { references }, Some(format!("{target}_id")))
        },
        SpecKind::Scalar(ty) => (ColumnKind::from(ty.parse::<ScalarType>()?), None),
    };

    let name = spec
        .name
        .or(default_name)
        .ok_or_else(|| ExportError::schema("column has no name"))?;
    validate_identifier(&name).map_err(|msg| ExportError::schema(format!("column {msg}")))?;

    Ok(Column {
        name,
        kind,
        label: spec.label,
        comment: spec.comment,
        uri_pattern: spec.uri_pattern,
        property: spec.property,
    })
}

fn in_table(table: &str, err: ExportError) -> ExportError {
    match err {
        ExportError::SchemaDefinition(msg) => {
            ExportError::schema(format!("table '{table}': {msg}"))
        },
        other => other,
    }
}

/// Names end up in SQL identifiers, file names and N3 local names
fn validate_identifier(name: &str) -> std::result::Result<(), String> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        },
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(format!("name '{name}' must match [A-Za-z_][A-Za-z0-9_]*"))
    }
}
