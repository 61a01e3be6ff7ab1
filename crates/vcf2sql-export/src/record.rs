//! Variant records as delivered by a [`crate::source::RecordSource`]
//!
//! These types mirror the parts of a VCF the exporter stores: the header
//! declarations, and per record the site fields, VEP predictions and
//! per-sample genotype calls.

use serde::{Deserialize, Serialize};

/// Entities declared once, before the first record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantHeader {
    /// Sample names in column order
    pub samples: Vec<String>,
    pub filters: Vec<FilterLine>,
    /// Reference sequences in dictionary order
    pub contigs: Vec<Contig>,
}

/// A `##FILTER` declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterLine {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A `##contig` declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contig {
    pub name: String,
    #[serde(default)]
    pub length: Option<i64>,
}

/// One variant site
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantRecord {
    pub chrom: String,
    /// 1-based position
    pub pos: i64,
    /// dbSNP identifier; `.` is treated as absent
    pub id: Option<String>,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(alias = "alt")]
    pub alternates: Vec<String>,
    /// Phred-scaled quality
    pub qual: Option<f64>,
    pub filters: Vec<String>,
    pub predictions: Vec<Prediction>,
    pub genotypes: Vec<Genotype>,
}

impl VariantRecord {
    /// Identifier with the missing-value marker filtered out
    pub fn rsid(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty() && *id != ".")
    }
}

/// One VEP consequence prediction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prediction {
    pub gene: Option<String>,
    pub transcript: Option<String>,
    pub protein: Option<String>,
    pub symbol: Option<String>,
    /// Sequence Ontology accessions, e.g. `SO:0001583`
    pub so_terms: Vec<String>,
}

/// The call of one sample at one site
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Genotype {
    pub sample: String,
    /// Alleles in call order; `.` marks a missing allele
    pub alleles: Vec<String>,
    pub dp: Option<i64>,
    pub gq: Option<f64>,
}

impl Genotype {
    /// True when at least one allele is called, including partial calls
    /// such as `A/.`
    pub fn is_called(&self) -> bool {
        self.alleles.iter().any(|a| called(a).is_some())
    }

    /// First and second allele. A missing allele is `None`, as is the
    /// second allele of a haploid call.
    pub fn allele_pair(&self) -> (Option<&str>, Option<&str>) {
        (self.allele(0), self.allele(1))
    }

    fn allele(&self, index: usize) -> Option<&str> {
        self.alleles.get(index).and_then(|a| called(a))
    }
}

fn called(a: &str) -> Option<&str> {
    Some(a).filter(|a| !a.is_empty() && *a != ".")
}
