//! Text artifacts derived from a resolved schema
//!
//! Every generator is a pure function of its input, so two runs over the
//! same records produce byte-identical scripts.

pub mod ddl;
pub mod load;
pub mod mapping;

pub use mapping::MappingOptions;

use crate::schema::ResolvedSchema;

pub const CREATE_FILE: &str = "create.mysql";
pub const LOAD_FILE: &str = "load.mysql";
pub const TRUNCATE_FILE: &str = "truncate.mysql";
pub const DROP_FILE: &str = "drop.mysql";
pub const MAPPING_FILE: &str = "mapping.n3";

/// All scripts and the mapping document for one export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub create: String,
    pub load: String,
    pub truncate: String,
    pub drop: String,
    pub mapping: String,
}

impl Artifacts {
    pub fn generate(resolved: &ResolvedSchema, options: &MappingOptions) -> Self {
        let schema = resolved.schema();
        Self {
            create: ddl::create_statements(resolved),
            load: load::load_statements(schema),
            truncate: ddl::truncate_statements(schema),
            drop: ddl::drop_statements(schema),
            mapping: mapping::mapping_document(schema, options),
        }
    }

    /// Archive members in the order they are written
    pub fn members(&self) -> [(&'static str, &str); 5] {
        [
            (CREATE_FILE, self.create.as_str()),
            (LOAD_FILE, self.load.as_str()),
            (TRUNCATE_FILE, self.truncate.as_str()),
            (DROP_FILE, self.drop.as_str()),
            (MAPPING_FILE, self.mapping.as_str()),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::schema::{ColumnSpec, ColumnStats, ResolvedSchema, SchemaBuilder};

    /// chromosome(id, name, length) <- variant(id, chromosome_id, pos, rsid, qual, depth)
    pub(crate) fn resolved_fixture() -> ResolvedSchema {
        let mut builder = SchemaBuilder::new();
        builder
            .table("chromosome")
            .rdf_class("vcf:Chromosome")
            .label("Chromosome")
            .comment("Reference \"sequence\"")
            .column(ColumnSpec::primary_key())
            .column(ColumnSpec::string("name").property("dc:title"))
            .column(ColumnSpec::integer("length"))
            .build()
            .unwrap();
        builder
            .table("variant")
            .column(ColumnSpec::primary_key())
            .column(ColumnSpec::foreign_key("chromosome"))
            .column(ColumnSpec::integer("pos"))
            .column(
                ColumnSpec::string("rsid")
                    .uri_pattern("http://identifiers.org/dbsnp/@@variant.rsid@@"),
            )
            .column(ColumnSpec::double("qual"))
            .column(ColumnSpec::integer("depth"))
            .build()
            .unwrap();
        let schema = Arc::new(builder.finish().unwrap());

        let plain = ColumnStats::default();
        let nullable = ColumnStats {
            saw_null: true,
            ..plain
        };
        let stats = vec![
            vec![
                plain,
                ColumnStats {
                    max_len: 5,
                    ..plain
                },
                plain,
            ],
            vec![
                plain,
                plain,
                plain,
                ColumnStats {
                    saw_null: true,
                    max_len: 11,
                    wide_integer: false,
                },
                nullable,
                ColumnStats {
                    wide_integer: true,
                    ..plain
                },
            ],
        ];
        ResolvedSchema::new(schema, stats, vec![2, 3])
    }
}
