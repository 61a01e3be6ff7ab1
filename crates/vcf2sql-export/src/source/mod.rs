//! Forward-only record streams
//!
//! The exporter reads its input through [`RecordSource`]: the header is
//! available before the first record and records are pulled one at a time.
//! Parsing the actual VCF format is left to whatever produces the source.

mod jsonl;

pub use jsonl::JsonLinesSource;

use std::collections::VecDeque;

use vcf2sql_common::Result;

use crate::record::{VariantHeader, VariantRecord};

/// A stream of variant records with their header
pub trait RecordSource {
    /// Name recorded in the `vcffile` table, usually the input path
    fn name(&self) -> &str;

    fn header(&self) -> &VariantHeader;

    /// Next record, `None` at end of input
    fn next_record(&mut self) -> Result<Option<VariantRecord>>;
}

impl<S: RecordSource + ?Sized> RecordSource for &mut S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn header(&self) -> &VariantHeader {
        (**self).header()
    }

    fn next_record(&mut self) -> Result<Option<VariantRecord>> {
        (**self).next_record()
    }
}

/// Records held in memory
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    header: VariantHeader,
    records: VecDeque<VariantRecord>,
}

impl MemorySource {
    pub fn new(
        name: impl Into<String>,
        header: VariantHeader,
        records: impl IntoIterator<Item = VariantRecord>,
    ) -> Self {
        Self {
            name: name.into(),
            header,
            records: records.into_iter().collect(),
        }
    }

    /// Records not yet read
    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

impl RecordSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn header(&self) -> &VariantHeader {
        &self.header
    }

    fn next_record(&mut self) -> Result<Option<VariantRecord>> {
        Ok(self.records.pop_front())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_drains_in_order() {
        let records = (1..=3).map(|pos| VariantRecord {
            chrom: "chr1".into(),
            pos,
            ..Default::default()
        });
        let mut source = MemorySource::new("mem.vcf", VariantHeader::default(), records);
        assert_eq!(source.name(), "mem.vcf");
        assert_eq!(source.remaining(), 3);

        let mut positions = Vec::new();
        while let Some(record) = source.next_record().unwrap() {
            positions.push(record.pos);
        }
        assert_eq!(positions, vec![1, 2, 3]);
        assert!(source.next_record().unwrap().is_none());
    }
}
