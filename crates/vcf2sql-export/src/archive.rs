//! Zip packaging of an export
//!
//! Members are written in a fixed order (staged tables in declared order,
//! then the SQL scripts, then the mapping) with fixed timestamps, so the
//! same input always yields the same archive bytes. The archive is built in
//! a temporary file beside the target and only renamed into place once it
//! is complete.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};
use vcf2sql_common::checksum::compute_file_sha256;
use vcf2sql_common::{ExportError, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// A finished archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedArchive {
    pub path: PathBuf,
    pub sha256: String,
    /// Member names in archive order
    pub members: Vec<String>,
}

/// Writes members into a temporary zip until [`ArchiveWriter::persist`]
pub struct ArchiveWriter {
    target: PathBuf,
    zip: ZipWriter<BufWriter<NamedTempFile>>,
    options: SimpleFileOptions,
    members: Vec<String>,
}

impl ArchiveWriter {
    /// Start an archive that will be stored at `target`
    pub fn create(target: &Path) -> Result<Self> {
        let dir = match target.parent() {
            Some(parent) if parent != Path::new("") => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file = tempfile::Builder::new()
            .prefix(".vcf2sql.")
            .suffix(".zip.partial")
            .tempfile_in(&dir)
            .map_err(|e| {
                ExportError::storage(format!(
                    "cannot create archive in {}: {e}",
                    dir.display()
                ))
            })?;

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);

        Ok(Self {
            target: target.to_path_buf(),
            zip: ZipWriter::new(BufWriter::new(file)),
            options,
            members: Vec::new(),
        })
    }

    /// Copy `reader` into a new member
    pub fn add_reader(&mut self, name: &str, reader: &mut impl io::Read) -> Result<u64> {
        self.start(name)?;
        let bytes = io::copy(reader, &mut self.zip)
            .map_err(|e| ExportError::storage(format!("cannot write archive member {name}: {e}")))?;
        debug!(member = name, bytes, "Wrote archive member");
        Ok(bytes)
    }

    /// Write `content` as a new member
    pub fn add_text(&mut self, name: &str, content: &str) -> Result<()> {
        self.start(name)?;
        self.zip
            .write_all(content.as_bytes())
            .map_err(|e| ExportError::storage(format!("cannot write archive member {name}: {e}")))?;
        debug!(member = name, bytes = content.len(), "Wrote archive member");
        Ok(())
    }

    fn start(&mut self, name: &str) -> Result<()> {
        if self.members.iter().any(|m| m == name) {
            return Err(ExportError::storage(format!("duplicate archive member {name}")));
        }
        self.zip
            .start_file(name, self.options)
            .map_err(|e| ExportError::storage(format!("cannot start archive member {name}: {e}")))?;
        self.members.push(name.to_string());
        Ok(())
    }

    /// Finish the zip and hash it, still under its temporary name
    pub fn finish(self) -> Result<FinishedArchive> {
        let buffered = self
            .zip
            .finish()
            .map_err(|e| ExportError::storage(format!("cannot finish archive: {e}")))?;
        let file = buffered
            .into_inner()
            .map_err(|e| ExportError::storage(format!("cannot flush archive: {}", e.error())))?;
        file.as_file()
            .sync_all()
            .map_err(|e| ExportError::storage(format!("cannot sync archive: {e}")))?;
        let sha256 = compute_file_sha256(file.path())?;

        Ok(FinishedArchive {
            target: self.target,
            file,
            sha256,
            members: self.members,
        })
    }

    /// Finish the zip and atomically move it to the target path
    pub fn persist(self) -> Result<PackagedArchive> {
        self.finish()?.persist()
    }
}

/// A complete archive that has not been moved to its target yet.
///
/// Dropping it deletes the temporary file.
#[derive(Debug)]
pub struct FinishedArchive {
    target: PathBuf,
    file: NamedTempFile,
    sha256: String,
    members: Vec<String>,
}

impl FinishedArchive {
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Rename the archive to its target; nothing can fail afterwards
    pub fn persist(self) -> Result<PackagedArchive> {
        let target = self.target;
        self.file.persist(&target).map_err(|e| {
            ExportError::storage(format!("cannot move archive to {}: {}", target.display(), e.error))
        })?;

        info!(
            path = %target.display(),
            members = self.members.len(),
            sha256 = %self.sha256,
            "Archive written"
        );
        Ok(PackagedArchive {
            path: target,
            sha256: self.sha256,
            members: self.members,
        })
    }
}

/// Member names of an existing archive, in stored order
pub fn list_members(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let unreadable = |e: zip::result::ZipError| {
        ExportError::storage(format!("cannot read archive {}: {e}", path.display()))
    };
    let mut archive = zip::ZipArchive::new(file).map_err(unreadable)?;
    (0..archive.len())
        .map(|i| {
            archive
                .by_index(i)
                .map(|member| member.name().to_string())
                .map_err(unreadable)
        })
        .collect()
}
