//! JSON lines input: a header object on the first line, then one record
//! per line.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use serde_jsonlines::JsonLinesReader;
use vcf2sql_common::{ExportError, Result};

use super::RecordSource;
use crate::record::{VariantHeader, VariantRecord};

pub struct JsonLinesSource<R> {
    name: String,
    header: VariantHeader,
    reader: JsonLinesReader<R>,
    /// Line number of the last line read, 1-based
    line: u64,
}

impl JsonLinesSource<BufReader<File>> {
    /// Open a file and read its header line
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            ExportError::ingestion(path.display().to_string(), format!("cannot open input: {e}"))
        })?;
        Self::from_reader(path.display().to_string(), BufReader::new(file))
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn from_reader(name: impl Into<String>, reader: R) -> Result<Self> {
        let name = name.into();
        let mut reader = JsonLinesReader::new(reader);
        let header = match reader.read::<VariantHeader>() {
            Ok(Some(header)) => header,
            Ok(None) => {
                return Err(ExportError::ingestion(
                    format!("{name}:1"),
                    "input is empty, expected a header line",
                ));
            },
            Err(e) => return Err(line_error(&name, 1, e)),
        };
        Ok(Self {
            name,
            header,
            reader,
            line: 1,
        })
    }
}

impl<R: BufRead> RecordSource for JsonLinesSource<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn header(&self) -> &VariantHeader {
        &self.header
    }

    fn next_record(&mut self) -> Result<Option<VariantRecord>> {
        self.line += 1;
        self.reader
            .read::<VariantRecord>()
            .map_err(|e| line_error(&self.name, self.line, e))
    }
}

fn line_error(name: &str, line: u64, e: io::Error) -> ExportError {
    let context = format!("{name}:{line}");
    match e.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
            ExportError::ingestion(context, format!("malformed JSON: {e}"))
        },
        _ => ExportError::ingestion(context, format!("cannot read input: {e}")),
    }
}
