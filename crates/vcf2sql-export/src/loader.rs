//! Decomposition of variant records into rows
//!
//! Header entities (the file, its samples, filters and reference sequences)
//! are inserted once and remembered by name. Every record then becomes one
//! `variant` row followed by its child rows, always parents before
//! children.

use std::collections::HashMap;

use tracing::debug;
use vcf2sql_common::{ExportError, Result};

use crate::ids::IdGenerator;
use crate::record::{Genotype, VariantHeader, VariantRecord};
use crate::staging::{StagingArea, Value};
use crate::variant_schema::VariantTables;

/// Filter values that do not name a declared filter
const IMPLICIT_FILTERS: [&str; 2] = ["PASS", "."];

/// Per-run name to key maps
#[derive(Debug)]
pub struct VariantLoader {
    tables: VariantTables,
    vcffile_id: Option<i64>,
    /// Samples in header order with their keys
    samples: Vec<(String, i64)>,
    sample_ids: HashMap<String, i64>,
    filter_ids: HashMap<String, i64>,
    chromosome_ids: HashMap<String, i64>,
    records: u64,
}

impl VariantLoader {
    pub fn new(tables: VariantTables) -> Self {
        Self {
            tables,
            vcffile_id: None,
            samples: Vec::new(),
            sample_ids: HashMap::new(),
            filter_ids: HashMap::new(),
            chromosome_ids: HashMap::new(),
            records: 0,
        }
    }

    pub fn tables(&self) -> &VariantTables {
        &self.tables
    }

    /// Records loaded so far
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Insert the file row and every entity its header declares
    pub fn load_header(
        &mut self,
        area: &mut StagingArea,
        ids: &mut IdGenerator,
        file: &str,
        header: &VariantHeader,
    ) -> Result<()> {
        let t = &self.tables;
        let vcffile_id = area.insert(t.vcffile, &[ids.next_id().into(), file.into()])?;

        for name in &header.samples {
            if self.sample_ids.contains_key(name) {
                return Err(ExportError::ingestion(
                    "header",
                    format!("sample '{name}' is declared twice"),
                ));
            }
            let id = area.insert(
                t.sample,
                &[ids.next_id().into(), vcffile_id.into(), name.into()],
            )?;
            self.sample_ids.insert(name.clone(), id);
            self.samples.push((name.clone(), id));
        }

        for filter in &header.filters {
            if self.filter_ids.contains_key(&filter.id) {
                return Err(ExportError::ingestion(
                    "header",
                    format!("filter '{}' is declared twice", filter.id),
                ));
            }
            let id = area.insert(
                t.filter,
                &[
                    ids.next_id().into(),
                    vcffile_id.into(),
                    filter.id.as_str().into(),
                    filter.description.as_deref().into(),
                ],
            )?;
            self.filter_ids.insert(filter.id.clone(), id);
        }

        for contig in &header.contigs {
            if self.chromosome_ids.contains_key(&contig.name) {
                return Err(ExportError::ingestion(
                    "header",
                    format!("chromosome '{}' is declared twice", contig.name),
                ));
            }
            let id = area.insert(
                t.chromosome,
                &[
                    ids.next_id().into(),
                    vcffile_id.into(),
                    contig.name.as_str().into(),
                    contig.length.into(),
                ],
            )?;
            self.chromosome_ids.insert(contig.name.clone(), id);
        }

        debug!(
            samples = self.samples.len(),
            filters = self.filter_ids.len(),
            chromosomes = self.chromosome_ids.len(),
            "Loaded header"
        );
        self.vcffile_id = Some(vcffile_id);
        Ok(())
    }

    /// Insert one record and all of its child rows
    pub fn load_record(
        &mut self,
        area: &mut StagingArea,
        ids: &mut IdGenerator,
        record: &VariantRecord,
    ) -> Result<()> {
        let index = self.records + 1;
        self.insert_record(area, ids, index, record)
            .map_err(|e| e.within(format!("record #{index} ({}:{})", record.chrom, record.pos)))?;
        self.records = index;
        Ok(())
    }

    fn insert_record(
        &self,
        area: &mut StagingArea,
        ids: &mut IdGenerator,
        index: u64,
        record: &VariantRecord,
    ) -> Result<()> {
        let t = &self.tables;
        let vcffile_id = self
            .vcffile_id
            .ok_or_else(|| ExportError::invalid_state("header loaded", "no header"))?;

        // Resolve every reference up front so a bad record writes nothing
        let chromosome_id = *self.chromosome_ids.get(&record.chrom).ok_or_else(|| {
            ExportError::ingestion(
                "chromosome",
                format!("'{}' is not declared in the header", record.chrom),
            )
        })?;
        let filter_ids = record
            .filters
            .iter()
            .filter(|f| !IMPLICIT_FILTERS.contains(&f.as_str()))
            .map(|f| {
                self.filter_ids.get(f).copied().ok_or_else(|| {
                    ExportError::ingestion("filter", format!("'{f}' is not declared in the header"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let genotypes = self.genotypes_by_sample(record)?;

        let index = i64::try_from(index)
            .map_err(|_| ExportError::ingestion("variant", "record index overflows"))?;
        let variant_id = area.insert(
            t.variant,
            &[
                ids.next_id().into(),
                vcffile_id.into(),
                index.into(),
                chromosome_id.into(),
                record.pos.into(),
                record.rsid().into(),
                record.reference.as_str().into(),
                record.qual.into(),
            ],
        )?;

        for alt in &record.alternates {
            area.insert(
                t.variant2alt,
                &[ids.next_id().into(), variant_id.into(), alt.as_str().into()],
            )?;
        }

        for filter_id in filter_ids {
            area.insert(
                t.variant2filter,
                &[ids.next_id().into(), variant_id.into(), filter_id.into()],
            )?;
        }

        for prediction in &record.predictions {
            let prediction_id = area.insert(
                t.vep_prediction,
                &[
                    ids.next_id().into(),
                    variant_id.into(),
                    prediction.gene.as_deref().into(),
                    prediction.transcript.as_deref().into(),
                    prediction.protein.as_deref().into(),
                    prediction.symbol.as_deref().into(),
                ],
            )?;
            for term in &prediction.so_terms {
                area.insert(
                    t.vep_prediction2so,
                    &[
                        ids.next_id().into(),
                        prediction_id.into(),
                        term.replace(':', "_").into(),
                    ],
                )?;
            }
        }

        for ((_, sample_id), genotype) in self.samples.iter().zip(genotypes) {
            let (a1, a2) = genotype.map_or((None, None), Genotype::allele_pair);
            area.insert(
                t.genotype,
                &[
                    ids.next_id().into(),
                    variant_id.into(),
                    (*sample_id).into(),
                    a1.into(),
                    a2.into(),
                    genotype.and_then(|g| g.dp).into(),
                    genotype.and_then(|g| g.gq).into(),
                ],
            )?;
        }
        Ok(())
    }

    /// Genotypes aligned with the header samples, `None` where a sample has
    /// no call in this record
    fn genotypes_by_sample<'r>(&self, record: &'r VariantRecord) -> Result<Vec<Option<&'r Genotype>>> {
        let mut aligned = vec![None; self.samples.len()];
        for genotype in &record.genotypes {
            let position = self
                .samples
                .iter()
                .position(|(name, _)| *name == genotype.sample)
                .ok_or_else(|| {
                    ExportError::ingestion(
                        "genotype",
                        format!("sample '{}' is not declared in the header", genotype.sample),
                    )
                })?;
            if aligned[position].replace(genotype).is_some() {
                return Err(ExportError::ingestion(
                    "genotype",
                    format!("sample '{}' has more than one genotype", genotype.sample),
                ));
            }
        }
        Ok(aligned)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::record::{Contig, FilterLine, Prediction};
    use std::io::Read;

    struct Fixture {
        loader: VariantLoader,
        area: StagingArea,
        ids: IdGenerator,
        _tmp: tempfile::TempDir,
    }

    fn header() -> VariantHeader {
        VariantHeader {
            samples: vec!["S1".into(), "S2".into()],
            filters: vec![FilterLine {
                id: "q10".into(),
                description: Some("Quality below 10".into()),
            }],
            contigs: vec![Contig {
                name: "chr1".into(),
                length: Some(1000),
            }],
        }
    }

    fn fixture() -> Fixture {
        let tables = VariantTables::build().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let mut area = StagingArea::open(tables.schema.clone(), tmp.path()).unwrap();
        let mut ids = IdGenerator::new();
        let mut loader = VariantLoader::new(tables);
        loader
            .load_header(&mut area, &mut ids, "test.vcf", &header())
            .unwrap();
        Fixture {
            loader,
            area,
            ids,
            _tmp: tmp,
        }
    }

    fn record() -> VariantRecord {
        VariantRecord {
            chrom: "chr1".into(),
            pos: 42,
            id: Some("rs123".into()),
            reference: "A".into(),
            alternates: vec!["G".into()],
            qual: Some(50.0),
            filters: vec!["PASS".into()],
            predictions: vec![Prediction {
                gene: Some("ENSG01".into()),
                so_terms: vec!["SO:0001583".into()],
                ..Default::default()
            }],
            genotypes: vec![Genotype {
                sample: "S2".into(),
                alleles: vec!["A".into(), "G".into()],
                dp: Some(7),
                gq: None,
            }],
        }
    }

    fn staged(f: &mut Fixture, table: crate::schema::TableId) -> String {
        f.area.close().unwrap();
        let mut content = String::new();
        f.area.staged_file(table).unwrap().read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_header_rows_share_file_key() {
        let mut f = fixture();
        let samples = f.loader.tables().sample;
        assert_eq!(staged(&mut f, samples), "2\t1\tS1\n3\t1\tS2\n");
    }

    #[test]
    fn test_record_rows_in_dependency_order() {
        let mut f = fixture();
        f.loader.load_record(&mut f.area, &mut f.ids, &record()).unwrap();
        assert_eq!(f.loader.records(), 1);

        let t = f.loader.tables().clone();
        // vcffile=1, samples=2,3, filter=4, chromosome=5
        f.area.close().unwrap();
        let read = |area: &StagingArea, table| {
            let mut s = String::new();
            area.staged_file(table).unwrap().read_to_string(&mut s).unwrap();
            s
        };
        assert_eq!(read(&f.area, t.variant), "6\t1\t1\t5\t42\trs123\tA\t50\n");
        assert_eq!(read(&f.area, t.variant2alt), "7\t6\tG\n");
        assert_eq!(read(&f.area, t.variant2filter), "");
        assert_eq!(read(&f.area, t.vep_prediction), "8\t6\tENSG01\t\\N\t\\N\t\\N\n");
        assert_eq!(read(&f.area, t.vep_prediction2so), "9\t8\tSO_0001583\n");
        assert_eq!(
            read(&f.area, t.genotype),
            "10\t6\t2\t\\N\t\\N\t\\N\t\\N\n11\t6\t3\tA\tG\t7\t\\N\n"
        );
    }

    #[test]
    fn test_partial_call_keeps_called_allele() {
        let mut f = fixture();
        let mut partial = record();
        partial.genotypes = vec![
            Genotype {
                sample: "S1".into(),
                alleles: vec!["A".into(), ".".into()],
                dp: Some(5),
                gq: None,
            },
            Genotype {
                sample: "S2".into(),
                alleles: vec![".".into(), ".".into()],
                dp: Some(3),
                gq: None,
            },
        ];
        f.loader.load_record(&mut f.area, &mut f.ids, &partial).unwrap();

        let genotypes = f.loader.tables().genotype;
        assert_eq!(
            staged(&mut f, genotypes),
            "10\t6\t2\tA\t\\N\t5\t\\N\n11\t6\t3\t\\N\t\\N\t3\t\\N\n"
        );
    }

    #[test]
    fn test_undeclared_filter_is_ingestion_error() {
        let mut f = fixture();
        let mut bad = record();
        bad.filters = vec!["lowDP".into()];
        let err = f.loader.load_record(&mut f.area, &mut f.ids, &bad).unwrap_err();
        assert!(matches!(err, ExportError::Ingestion { .. }));
        assert!(err.to_string().contains("record #1 (chr1:42)"), "{err}");
        assert!(err.to_string().contains("'lowDP' is not declared"));
        assert_eq!(f.area.rows(f.loader.tables().variant), 0);
    }

    #[test]
    fn test_undeclared_chromosome_and_sample_rejected() {
        let mut f = fixture();
        let mut bad = record();
        bad.chrom = "chrUn".into();
        let err = f.loader.load_record(&mut f.area, &mut f.ids, &bad).unwrap_err();
        assert!(err.to_string().contains("'chrUn' is not declared"));

        let mut bad = record();
        bad.genotypes[0].sample = "S9".into();
        let err = f.loader.load_record(&mut f.area, &mut f.ids, &bad).unwrap_err();
        assert!(err.to_string().contains("sample 'S9'"));
    }

    #[test]
    fn test_duplicate_header_sample_rejected() {
        let tables = VariantTables::build().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let mut area = StagingArea::open(tables.schema.clone(), tmp.path()).unwrap();
        let mut loader = VariantLoader::new(tables);
        let mut header = header();
        header.samples.push("S1".into());
        let err = loader
            .load_header(&mut area, &mut IdGenerator::new(), "dup.vcf", &header)
            .unwrap_err();
        assert!(err.to_string().contains("sample 'S1' is declared twice"));
    }
}
