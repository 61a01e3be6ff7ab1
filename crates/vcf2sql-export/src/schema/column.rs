//! Column kinds and column declarations

use std::str::FromStr;

use vcf2sql_common::ExportError;

use super::TableId;

/// Declared type of a scalar column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Integer,
    Double,
}

impl FromStr for ScalarType {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" | "str" | "text" | "varchar" => Ok(ScalarType::String),
            "integer" | "int" | "long" => Ok(ScalarType::Integer),
            "double" | "float" | "real" => Ok(ScalarType::Double),
            _ => Err(ExportError::schema(format!(
                "unsupported column type '{s}', expected one of: string, integer, double"
            ))),
        }
    }
}

/// What a column holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Surrogate key of its own table
    PrimaryKey,
    /// Surrogate key of a table declared earlier in the schema
    ForeignKey { references: TableId },
    String,
    Integer,
    Double,
}

impl From<ScalarType> for ColumnKind {
    fn from(ty: ScalarType) -> Self {
        match ty {
            ScalarType::String => ColumnKind::String,
            ScalarType::Integer => ColumnKind::Integer,
            ScalarType::Double => ColumnKind::Double,
        }
    }
}

/// A column of a built table. Immutable; observed statistics live in the
/// staging area and are joined back in by [`super::ResolvedSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub(crate) name: String,
    pub(crate) kind: ColumnKind,
    pub(crate) label: Option<String>,
    pub(crate) comment: Option<String>,
    pub(crate) uri_pattern: Option<String>,
    pub(crate) property: Option<String>,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn is_primary_key(&self) -> bool {
        self.kind == ColumnKind::PrimaryKey
    }

    /// Target table when this column is a foreign key
    pub fn references(&self) -> Option<TableId> {
        match self.kind {
            ColumnKind::ForeignKey { references } => Some(references),
            _ => None,
        }
    }

    /// Label, falling back to the column name
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Comment, falling back to the label
    pub fn comment(&self) -> &str {
        self.comment.as_deref().unwrap_or_else(|| self.label())
    }

    /// URI pattern that replaces the literal column value in the mapping
    pub fn uri_pattern(&self) -> Option<&str> {
        self.uri_pattern.as_deref()
    }

    /// Semantic property override
    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }
}

#[derive(Debug, Clone)]
pub(crate) enum SpecKind {
    PrimaryKey,
    ForeignKey(String),
    Scalar(String),
}

/// Declaration of a column handed to [`super::TableBuilder::column`].
///
/// Foreign keys name their target table; the name is resolved when the
/// table is built, so the target must already exist by then.
///
/// ```
/// use vcf2sql_export::schema::ColumnSpec;
///
/// let spec = ColumnSpec::string("name").property("dc:title").label("Name");
/// # let _ = spec;
/// ```
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub(crate) name: Option<String>,
    pub(crate) kind: SpecKind,
    pub(crate) label: Option<String>,
    pub(crate) comment: Option<String>,
    pub(crate) uri_pattern: Option<String>,
    pub(crate) property: Option<String>,
}

impl ColumnSpec {
    fn with_kind(name: Option<String>, kind: SpecKind) -> Self {
        Self {
            name,
            kind,
            label: None,
            comment: None,
            uri_pattern: None,
            property: None,
        }
    }

    /// The `id` surrogate key column
    pub fn primary_key() -> Self {
        Self::with_kind(Some("id".to_string()), SpecKind::PrimaryKey)
    }

    /// A `<table>_id` column referencing `table`
    pub fn foreign_key(table: impl Into<String>) -> Self {
        Self::with_kind(None, SpecKind::ForeignKey(table.into()))
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::typed(name, "string")
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::typed(name, "integer")
    }

    pub fn double(name: impl Into<String>) -> Self {
        Self::typed(name, "double")
    }

    /// Scalar column with a type given by name; an unknown type fails when
    /// the table is built.
    pub fn typed(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self::with_kind(Some(name.into()), SpecKind::Scalar(ty.into()))
    }

    /// Override the column name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
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

    pub fn uri_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.uri_pattern = Some(pattern.into());
        self
    }

    pub fn property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }
}
