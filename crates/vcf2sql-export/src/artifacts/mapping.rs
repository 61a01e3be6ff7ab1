//! D2RQ mapping document
//!
//! Describes how the relational tables map onto RDF so the database can be
//! served by D2RQ once loaded. Prefixes used in the document:
//!
//! | prefix | namespace |
//! |--------|-----------|
//! | `vcf`  | local class and property vocabulary (configurable) |
//! | `foaf` | `http://xmlns.com/foaf/0.1/` |
//! | `dc`   | `http://purl.org/dc/elements/1.1/` |
//! | `d2rq` | `http://www.wiwiss.fu-berlin.de/suhl/bizer/D2RQ/0.1#` |
//! | `map`  | mapping resources, never part of the mapped data |
//! | `rdfs` | `http://www.w3.org/2000/01/rdf-schema#` |
//! | `xsd`  | `http://www.w3.org/2001/XMLSchema#` |

use serde::{Deserialize, Serialize};

use crate::schema::{Column, ColumnKind, Schema, Table};

/// Default local vocabulary namespace
pub const DEFAULT_VOCABULARY_NS: &str = "https://github.com/vcf2sql/vcf2sql/vocab/1.0/";

/// Default base of the generated resource URIs
pub const DEFAULT_RESOURCE_BASE: &str = "https://github.com/vcf2sql/vcf2sql/resource/";

pub const DEFAULT_JDBC_DSN: &str = "JDBC_URI";
pub const DEFAULT_JDBC_DRIVER: &str = "com.mysql.jdbc.Driver";
pub const DEFAULT_JDBC_USER: &str = "JDBC_USER";
pub const DEFAULT_JDBC_PASSWORD: &str = "JDBC_PASSWORD";

const PREFIXES: &[(&str, &str, &str)] = &[
    ("foaf", "http://xmlns.com/foaf/0.1/", "FOAF"),
    ("dc", "http://purl.org/dc/elements/1.1/", "Dublin Core"),
    ("d2rq", "http://www.wiwiss.fu-berlin.de/suhl/bizer/D2RQ/0.1#", "D2RQ mapping language"),
    ("map", "#", "Mapping resources; never appear in mapped data"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#", "RDF Schema"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#", "XML Schema datatypes"),
];

const DATABASE: &str = "map:Database1";

/// Namespaces and connection placeholders written into the mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingOptions {
    pub vocabulary_ns: String,
    pub resource_base: String,
    pub jdbc_dsn: String,
    pub jdbc_driver: String,
    pub jdbc_user: String,
    pub jdbc_password: String,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            vocabulary_ns: DEFAULT_VOCABULARY_NS.to_string(),
            resource_base: DEFAULT_RESOURCE_BASE.to_string(),
            jdbc_dsn: DEFAULT_JDBC_DSN.to_string(),
            jdbc_driver: DEFAULT_JDBC_DRIVER.to_string(),
            jdbc_user: DEFAULT_JDBC_USER.to_string(),
            jdbc_password: DEFAULT_JDBC_PASSWORD.to_string(),
        }
    }
}

/// Subject with its predicate/object pairs, rendered as one N3 statement
struct Block {
    subject: String,
    pairs: Vec<(&'static str, String)>,
}

impl Block {
    fn new(subject: impl Into<String>, rdf_type: &str) -> Self {
        Self {
            subject: subject.into(),
            pairs: vec![("a", rdf_type.to_string())],
        }
    }

    fn with(mut self, predicate: &'static str, object: impl Into<String>) -> Self {
        self.pairs.push((predicate, object.into()));
        self
    }

    fn render(&self, out: &mut String) {
        out.push_str(&self.subject);
        for (i, (predicate, object)) in self.pairs.iter().enumerate() {
            out.push_str(if i == 0 { " " } else { "\n\t" });
            out.push_str(predicate);
            out.push(' ');
            out.push_str(object);
            out.push_str(if i + 1 == self.pairs.len() { " .\n" } else { " ;" });
        }
    }
}

/// Render the mapping for every table and column in declared order
pub fn mapping_document(schema: &Schema, options: &MappingOptions) -> String {
    let mut out = String::new();

    out.push_str("# Local vocabulary\n");
    out.push_str(&format!("@prefix vcf: <{}> .\n", options.vocabulary_ns));
    for (prefix, ns, comment) in PREFIXES {
        out.push_str(&format!("# {comment}\n@prefix {prefix}: <{ns}> .\n"));
    }
    out.push('\n');

    Block::new(DATABASE, "d2rq:Database")
        .with("d2rq:jdbcDSN", literal(&options.jdbc_dsn))
        .with("d2rq:jdbcDriver", literal(&options.jdbc_driver))
        .with("d2rq:username", literal(&options.jdbc_user))
        .with("d2rq:password", literal(&options.jdbc_password))
        .render(&mut out);

    for table in schema.tables() {
        out.push_str(&format!("\n# Table {}\n", table.name()));
        class_map(table, options).render(&mut out);
        label_bridge(table).render(&mut out);
        for column in table.columns() {
            property_bridge(schema, table, column).render(&mut out);
        }
    }
    out
}

fn class_map(table: &Table, options: &MappingOptions) -> Block {
    let pk = format!("{}.{}", table.name(), table.primary_key().name());
    Block::new(class_map_name(table), "d2rq:ClassMap")
        .with("d2rq:dataStorage", DATABASE)
        .with(
            "d2rq:uriPattern",
            literal(&format!("{}{}/@@{pk}@@", options.resource_base, table.name())),
        )
        .with(
            "d2rq:class",
            table
                .rdf_class()
                .map_or_else(|| format!("vcf:{}", table.name()), str::to_string),
        )
        .with("d2rq:classDefinitionLabel", lang_literal(table.label()))
        .with("d2rq:classDefinitionComment", lang_literal(table.comment()))
}

fn label_bridge(table: &Table) -> Block {
    let pk = format!("{}.{}", table.name(), table.primary_key().name());
    Block::new(format!("{}__label", class_map_name(table)), "d2rq:PropertyBridge")
        .with("d2rq:belongsToClassMap", class_map_name(table))
        .with("d2rq:property", "rdfs:label")
        .with("d2rq:pattern", literal(&format!("{} #@@{pk}@@", table.label())))
}

fn property_bridge(schema: &Schema, table: &Table, column: &Column) -> Block {
    let mut block = Block::new(
        format!("map:{}_{}", table.name(), column.name()),
        "d2rq:PropertyBridge",
    )
    .with("d2rq:belongsToClassMap", class_map_name(table));

    let qualified = format!("{}.{}", table.name(), column.name());
    block = match (column.references(), column.uri_pattern()) {
        (Some(parent), _) => {
            let parent = schema.table(parent);
            block
                .with("d2rq:refersToClassMap", class_map_name(parent))
                .with(
                    "d2rq:join",
                    literal(&format!(
                        "{qualified} => {}.{}",
                        parent.name(),
                        parent.primary_key().name()
                    )),
                )
        },
        (None, Some(pattern)) => block.with("d2rq:uriPattern", literal(pattern)),
        (None, None) => block.with("d2rq:column", literal(&qualified)),
    };

    block = block
        .with(
            "d2rq:property",
            column
                .property()
                .map_or_else(|| format!("vcf:{}", column.name()), str::to_string),
        )
        .with("d2rq:propertyDefinitionLabel", lang_literal(column.label()))
        .with("d2rq:propertyDefinitionComment", lang_literal(column.comment()));

    match xsd_type(column) {
        Some(datatype) if column.uri_pattern().is_none() => block.with("d2rq:datatype", datatype),
        _ => block,
    }
}

fn class_map_name(table: &Table) -> String {
    format!("map:{}", table.name())
}

/// Datatype of literal columns; foreign keys map to resources instead
fn xsd_type(column: &Column) -> Option<&'static str> {
    match column.kind() {
        ColumnKind::PrimaryKey => Some("xsd:long"),
        ColumnKind::ForeignKey { .. } => None,
        ColumnKind::String => Some("xsd:string"),
        ColumnKind::Integer => Some("xsd:int"),
        ColumnKind::Double => Some("xsd:double"),
    }
}

/// Quoted N3 string literal
fn literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn lang_literal(s: &str) -> String {
    format!("{}@en", literal(s))
}
