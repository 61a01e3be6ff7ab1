//! Test helpers for vcf2sql export integration tests
//!
//! - Record and header builders
//! - Running an export into a scratch directory
//! - Reading the produced archive back as decoded rows

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use vcf2sql_common::Result;
use vcf2sql_export::config::ExportConfig;
use vcf2sql_export::record::{Contig, FilterLine, Genotype, Prediction, VariantHeader, VariantRecord};
use vcf2sql_export::source::MemorySource;
use vcf2sql_export::staging::codec::split_line;
use vcf2sql_export::{ExportSummary, Exporter};

pub const PREFIX: &str = "vcf2sql.output/";

// ============================================================================
// Record Fixtures
// ============================================================================

/// Builder for variant records with fluent API
#[derive(Debug, Clone)]
pub struct RecordFixture {
    record: VariantRecord,
}

impl RecordFixture {
    pub fn new(chrom: &str, pos: i64) -> Self {
        Self {
            record: VariantRecord {
                chrom: chrom.to_string(),
                pos,
                reference: "A".to_string(),
                alternates: vec!["G".to_string()],
                ..Default::default()
            },
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.record.id = Some(id.to_string());
        self
    }

    pub fn with_qual(mut self, qual: f64) -> Self {
        self.record.qual = Some(qual);
        self
    }

    pub fn with_filter(mut self, filter: &str) -> Self {
        self.record.filters.push(filter.to_string());
        self
    }

    pub fn with_prediction(mut self, gene: &str, so_terms: &[&str]) -> Self {
        self.record.predictions.push(Prediction {
            gene: Some(gene.to_string()),
            symbol: Some(format!("SYM_{gene}")),
            so_terms: so_terms.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        });
        self
    }

    pub fn with_genotype(mut self, sample: &str, alleles: &[&str], dp: Option<i64>) -> Self {
        self.record.genotypes.push(Genotype {
            sample: sample.to_string(),
            alleles: alleles.iter().map(|s| s.to_string()).collect(),
            dp,
            gq: None,
        });
        self
    }

    pub fn build(self) -> VariantRecord {
        self.record
    }
}

/// Header with two samples, two filters and two reference sequences
pub fn header() -> VariantHeader {
    VariantHeader {
        samples: vec!["NA12878".to_string(), "NA12891".to_string()],
        filters: vec![
            FilterLine {
                id: "q10".to_string(),
                description: Some("Quality below 10".to_string()),
            },
            FilterLine {
                id: "s50".to_string(),
                description: Some("Less than 50% of samples have data".to_string()),
            },
        ],
        contigs: vec![
            Contig {
                name: "chr1".to_string(),
                length: Some(248_956_422),
            },
            Contig {
                name: "chr2".to_string(),
                length: Some(242_193_529),
            },
        ],
    }
}

pub fn source(header: VariantHeader, records: Vec<VariantRecord>) -> MemorySource {
    MemorySource::new("fixture.vcf", header, records)
}

// ============================================================================
// Export Runs
// ============================================================================

/// Scratch directory holding the output archive and the staging area
pub struct TestRun {
    pub dir: TempDir,
}

impl TestRun {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create scratch directory"),
        }
    }

    pub fn output(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn config(&self, name: &str) -> ExportConfig {
        let mut config = ExportConfig::new(self.output(name));
        config.tmp_dir = Some(self.dir.path().to_path_buf());
        config
    }

    pub fn export(&self, name: &str, mut source: MemorySource) -> Result<ExportSummary> {
        Exporter::new(self.config(name))?.run(&mut source)
    }

    /// Entries of the scratch directory other than archives
    pub fn leftovers(&self) -> Vec<String> {
        std::fs::read_dir(self.dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| !name.ends_with(".zip"))
            .collect()
    }
}

// ============================================================================
// Archive Inspection
// ============================================================================

/// Every member of an archive, decoded as UTF-8
pub struct ExportedArchive {
    pub members: Vec<String>,
    files: HashMap<String, String>,
}

impl ExportedArchive {
    pub fn open(path: &Path) -> Self {
        let mut zip = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut members = Vec::new();
        let mut files = HashMap::new();
        for i in 0..zip.len() {
            let mut member = zip.by_index(i).unwrap();
            let mut content = String::new();
            member.read_to_string(&mut content).unwrap();
            members.push(member.name().to_string());
            files.insert(member.name().to_string(), content);
        }
        Self { members, files }
    }

    pub fn file(&self, name: &str) -> &str {
        self.files
            .get(&format!("{PREFIX}{name}"))
            .unwrap_or_else(|| panic!("missing member {name}"))
    }

    /// Decoded rows of a staged table
    pub fn rows(&self, table: &str) -> Vec<Vec<Option<String>>> {
        self.file(&format!("{table}.tsv"))
            .lines()
            .map(split_line)
            .collect()
    }

    /// Primary keys of a staged table
    pub fn keys(&self, table: &str) -> Vec<i64> {
        self.rows(table)
            .iter()
            .map(|row| row[0].as_deref().unwrap().parse().unwrap())
            .collect()
    }
}
