//! Export orchestration
//!
//! An [`Exporter`] walks through a fixed sequence of states:
//!
//! ```text
//! Idle --open--> Opened --ingest--> Streaming --finalize--> Finalizing --package--> Packaged
//!   \______________\___________________\________________________\_______> Failed
//! ```
//!
//! Any error moves it to `Failed` and deletes the staging directory, so a
//! failed run leaves neither staged files nor an archive behind.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{error, info};
use vcf2sql_common::{ExportError, Result};

use crate::archive::ArchiveWriter;
use crate::artifacts::load::staged_file_name;
use crate::artifacts::Artifacts;
use crate::config::ExportConfig;
use crate::ids::IdGenerator;
use crate::loader::VariantLoader;
use crate::schema::ResolvedSchema;
use crate::source::RecordSource;
use crate::staging::StagingArea;
use crate::variant_schema::VariantTables;

/// Lifecycle of an export run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExportState {
    Idle,
    Opened,
    Streaming,
    Finalizing,
    Packaged,
    Failed,
}

impl ExportState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExportState::Packaged | ExportState::Failed)
    }
}

impl fmt::Display for ExportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportState::Idle => "idle",
            ExportState::Opened => "opened",
            ExportState::Streaming => "streaming",
            ExportState::Finalizing => "finalizing",
            ExportState::Packaged => "packaged",
            ExportState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a packaged export
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub archive: PathBuf,
    pub sha256: String,
    pub records: u64,
    /// Rows written per table
    pub rows: BTreeMap<String, u64>,
    /// Archive members in stored order
    pub members: Vec<String>,
}

/// Drives one input through staging, artifact generation and packaging
#[derive(Debug)]
pub struct Exporter {
    config: ExportConfig,
    state: ExportState,
    loader: VariantLoader,
    ids: IdGenerator,
    staging: Option<StagingArea>,
    finalized: Option<(ResolvedSchema, Artifacts)>,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: ExportState::Idle,
            loader: VariantLoader::new(VariantTables::build()?),
            ids: IdGenerator::new(),
            staging: None,
            finalized: None,
        })
    }

    pub fn state(&self) -> ExportState {
        self.state
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Run every step on `source`
    pub fn run(mut self, source: &mut impl RecordSource) -> Result<ExportSummary> {
        self.open()?;
        self.ingest(source)?;
        self.finalize()?;
        self.package()
    }

    /// Open a staging file for every table
    pub fn open(&mut self) -> Result<()> {
        self.step(ExportState::Idle, |this| {
            let area = StagingArea::open(
                this.loader.tables().schema.clone(),
                &this.config.staging_dir(),
            )?;
            this.staging = Some(area);
            Ok(ExportState::Opened)
        })
    }

    /// Stage the header entities and every record of `source`
    pub fn ingest(&mut self, source: &mut impl RecordSource) -> Result<u64> {
        self.step(ExportState::Opened, |this| {
            this.state = ExportState::Streaming;
            let interval = this.config.progress_interval;
            let Exporter {
                loader,
                ids,
                staging,
                ..
            } = this;
            let area = staging
                .as_mut()
                .ok_or_else(|| ExportError::invalid_state("staging area", "none"))?;

            info!(input = source.name(), "Reading records");
            loader.load_header(area, ids, source.name(), source.header())?;
            while let Some(record) = source.next_record()? {
                loader.load_record(area, ids, &record)?;
                if loader.records() % interval == 0 {
                    info!(
                        records = loader.records(),
                        chrom = %record.chrom,
                        pos = record.pos,
                        "Progress"
                    );
                }
            }
            info!(records = loader.records(), last_key = ids.last(), "End of input");
            Ok(ExportState::Streaming)
        })?;
        Ok(self.loader.records())
    }

    /// Close the staging files and generate the scripts and mapping
    pub fn finalize(&mut self) -> Result<()> {
        self.step(ExportState::Streaming, |this| {
            this.state = ExportState::Finalizing;
            let area = this
                .staging
                .as_mut()
                .ok_or_else(|| ExportError::invalid_state("staging area", "none"))?;
            area.close()?;
            let resolved = area.resolve()?;
            let artifacts = Artifacts::generate(&resolved, &this.config.mapping);
            info!(tables = resolved.schema().len(), "Generated schema artifacts");
            this.finalized = Some((resolved, artifacts));
            Ok(ExportState::Finalizing)
        })
    }

    /// Write the archive and delete the staging directory
    pub fn package(&mut self) -> Result<ExportSummary> {
        self.require_state(ExportState::Finalizing)?;
        let result = self.write_archive();
        match result {
            Ok(summary) => {
                self.state = ExportState::Packaged;
                Ok(summary)
            },
            Err(e) => {
                self.fail(&e);
                Err(e)
            },
        }
    }

    fn write_archive(&mut self) -> Result<ExportSummary> {
        let (resolved, artifacts) = self
            .finalized
            .take()
            .ok_or_else(|| ExportError::invalid_state("finalized schema", "none"))?;
        let area = self
            .staging
            .take()
            .ok_or_else(|| ExportError::invalid_state("staging area", "none"))?;

        let mut writer = ArchiveWriter::create(&self.config.output)?;
        for table in resolved.schema().tables() {
            let mut staged = area.staged_file(table.id())?;
            writer.add_reader(
                &self.config.member_name(&staged_file_name(table.name())),
                &mut staged,
            )?;
        }
        for (file, content) in artifacts.members() {
            writer.add_text(&self.config.member_name(file), content)?;
        }
        let finished = writer.finish()?;
        // A staging cleanup failure must not leave a published archive
        area.finalize()?;
        let archive = finished.persist()?;

        Ok(ExportSummary {
            archive: archive.path,
            sha256: archive.sha256,
            records: self.loader.records(),
            rows: resolved
                .tables()
                .map(|t| (t.table.name().to_string(), t.rows))
                .collect(),
            members: archive.members,
        })
    }

    fn require_state(&self, expected: ExportState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ExportError::invalid_state(expected.to_string(), self.state.to_string()))
        }
    }

    /// Run `f` from state `expected`; `f` returns the state reached
    fn step(
        &mut self,
        expected: ExportState,
        f: impl FnOnce(&mut Self) -> Result<ExportState>,
    ) -> Result<()> {
        self.require_state(expected)?;
        match f(self) {
            Ok(state) => {
                self.state = state;
                Ok(())
            },
            Err(e) => {
                self.fail(&e);
                Err(e)
            },
        }
    }

    fn fail(&mut self, e: &ExportError) {
        error!(state = %self.state, error = %e, "Export failed");
        self.state = ExportState::Failed;
        self.finalized = None;
        // Dropping the staging area removes its directory
        self.staging = None;
    }
}
