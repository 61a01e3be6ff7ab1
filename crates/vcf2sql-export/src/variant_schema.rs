//! The relational layout of a VCF file
//!
//! ```text
//! vcffile ─┬─ sample ──────────────────────────┐
//!          ├─ filter ───────────┐              │
//!          ├─ chromosome ─┐     │              │
//!          └──────────── variant ─┬─ variant2alt
//!                                 ├─ variant2filter
//!                                 ├─ vepPrediction ── vepPrediction2so
//!                                 └─ genotype
//! ```

use std::sync::Arc;

use vcf2sql_common::Result;

use crate::schema::{ColumnSpec, Schema, SchemaBuilder, TableId};

/// The variant schema with the id of each of its tables
#[derive(Debug, Clone)]
pub struct VariantTables {
    pub schema: Arc<Schema>,
    pub vcffile: TableId,
    pub sample: TableId,
    pub filter: TableId,
    pub chromosome: TableId,
    pub variant: TableId,
    pub variant2alt: TableId,
    pub variant2filter: TableId,
    pub vep_prediction: TableId,
    pub vep_prediction2so: TableId,
    pub genotype: TableId,
}

impl VariantTables {
    pub fn build() -> Result<Self> {
        let mut b = SchemaBuilder::new();

        let vcffile = b
            .table("vcffile")
            .label("VCF file")
            .column(ColumnSpec::primary_key())
            .column(ColumnSpec::string("file"))
            .build()?;

        let sample = b
            .table("sample")
            .rdf_class("foaf:Person")
            .column(ColumnSpec::primary_key())
            .column(ColumnSpec::foreign_key("vcffile"))
            .column(ColumnSpec::string("name").property("foaf:name"))
            .build()?;

        let filter = b
            .table("filter")
            .rdf_class("vcf:Filter")
            .column(ColumnSpec::primary_key())
            .column(ColumnSpec::foreign_key("vcffile"))
            .column(ColumnSpec::string("name"))
            .column(ColumnSpec::string("description"))
            .build()?;

        let chromosome = b
            .table("chromosome")
            .rdf_class("vcf:Chromosome")
            .column(ColumnSpec::primary_key())
            .column(ColumnSpec::foreign_key("vcffile"))
            .column(ColumnSpec::string("name").property("dc:title"))
            .column(ColumnSpec::integer("chromLength").label("length"))
            .build()?;

        let variant = b
            .table("variant")
            .rdf_class("vcf:Variant")
            .column(ColumnSpec::primary_key())
            .column(ColumnSpec::foreign_key("vcffile"))
            .column(ColumnSpec::integer("index_in_file").comment("1-based index of the record in its file"))
            .column(ColumnSpec::foreign_key("chromosome"))
            .column(ColumnSpec::integer("pos").label("position"))
            .column(ColumnSpec::string("rsid"))
            .column(ColumnSpec::string("ref").label("reference allele"))
            .column(ColumnSpec::double("qual").label("quality"))
            .build()?;

        let variant2alt = b
            .table("variant2alt")
            .rdf_class("vcf:AlternateAllele")
            .column(ColumnSpec::primary_key())
            .column(ColumnSpec::foreign_key("variant"))
            .column(ColumnSpec::string("alt").label("alternate allele"))
            .build()?;

        let variant2filter = b
            .table("variant2filter")
            .column(ColumnSpec::primary_key())
            .column(ColumnSpec::foreign_key("variant"))
            .column(ColumnSpec::foreign_key("filter"))
            .build()?;

        let vep_prediction = b
            .table("vepPrediction")
            .label("VEP prediction")
            .rdf_class("vcf:VepPrediction")
            .column(ColumnSpec::primary_key())
            .column(ColumnSpec::foreign_key("variant"))
            .column(
                ColumnSpec::string("ensGene")
                    .uri_pattern("http://purl.uniprot.org/ensembl/@@vepPrediction.ensGene@@"),
            )
            .column(
                ColumnSpec::string("ensTranscript")
                    .uri_pattern("http://purl.uniprot.org/ensembl/@@vepPrediction.ensTranscript@@"),
            )
            .column(ColumnSpec::string("ensProtein"))
            .column(ColumnSpec::string("geneSymbol"))
            .build()?;

        let vep_prediction2so = b
            .table("vepPrediction2so")
            .column(ColumnSpec::primary_key())
            .column(ColumnSpec::foreign_key("vepPrediction"))
            .column(
                ColumnSpec::string("acn")
                    .label("sequence ontology term")
                    .uri_pattern("http://purl.obolibrary.org/obo/@@vepPrediction2so.acn@@"),
            )
            .build()?;

        let genotype = b
            .table("genotype")
            .column(ColumnSpec::primary_key())
            .column(ColumnSpec::foreign_key("variant"))
            .column(ColumnSpec::foreign_key("sample"))
            .column(ColumnSpec::string("a1"))
            .column(ColumnSpec::string("a2"))
            .column(ColumnSpec::integer("dp").label("depth"))
            .column(ColumnSpec::double("gq").label("genotype quality"))
            .build()?;

        Ok(Self {
            schema: Arc::new(b.finish()?),
            vcffile,
            sample,
            filter,
            chromosome,
            variant,
            variant2alt,
            variant2filter,
            vep_prediction,
            vep_prediction2so,
            genotype,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_order() {
        let tables = VariantTables::build().unwrap();
        let names: Vec<&str> = tables.schema.tables().iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                "vcffile",
                "sample",
                "filter",
                "chromosome",
                "variant",
                "variant2alt",
                "variant2filter",
                "vepPrediction",
                "vepPrediction2so",
                "genotype",
            ]
        );
    }

    #[test]
    fn test_foreign_keys_point_backwards() {
        let tables = VariantTables::build().unwrap();
        for table in tables.schema.tables() {
            for (_, fk) in table.foreign_keys() {
                assert!(fk.references().unwrap() < table.id(), "{}.{}", table.name(), fk.name());
            }
        }

        let genotype = tables.schema.table(tables.genotype);
        let fks: Vec<&str> = genotype.foreign_keys().map(|(_, c)| c.name()).collect();
        assert_eq!(fks, vec!["variant_id", "sample_id"]);
    }

    #[test]
    fn test_rdf_classes() {
        let tables = VariantTables::build().unwrap();
        let classes: Vec<(&str, Option<&str>)> = tables
            .schema
            .tables()
            .iter()
            .map(|t| (t.name(), t.rdf_class()))
            .collect();
        assert_eq!(
            classes,
            vec![
                ("vcffile", None),
                ("sample", Some("foaf:Person")),
                ("filter", Some("vcf:Filter")),
                ("chromosome", Some("vcf:Chromosome")),
                ("variant", Some("vcf:Variant")),
                ("variant2alt", Some("vcf:AlternateAllele")),
                ("variant2filter", None),
                ("vepPrediction", Some("vcf:VepPrediction")),
                ("vepPrediction2so", None),
                ("genotype", None),
            ]
        );
    }
}
