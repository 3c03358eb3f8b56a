//! Workflow orchestration: upload → filter | round → mean.
//!
//! Each step resolves its input through the storage key, runs one
//! transform, and persists the outputs under stage-prefixed names:
//!
//! ```text
//! uploads/<key>  ──filter──▶  download_folder/PC_<key>
//!                              download_folder/LPC_<key>
//!                              download_folder/plasmalogen_<key>
//!                ──round───▶  download_folder/Roundoff_Retention_<key>
//!                                   │
//!                                   └──mean──▶  download_folder/mean_dataFrame_<key>
//! ```
//!
//! No state is kept in memory apart from per-key locks; progress is
//! whatever files exist (see [`WorkflowStatus`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use metaboflow::{StorageConfig, Workflow};
//!
//! let workflow = Workflow::new(StorageConfig::default())?;
//! workflow.upload("alice", "lipids.xlsx", &bytes)?;
//! workflow.round("alice", "lipids.xlsx")?;
//! let output = workflow.mean("alice", "lipids.xlsx")?;
//! println!("{}", output.files[0].display_name);
//! ```

pub mod locks;
pub mod state;

use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::config::StorageConfig;
use crate::error::{WorkflowError, WorkflowResult};
use crate::identity::{build_key, resolve, StorageKey, StoredFile};
use crate::models::{Stage, Table};
use crate::sheet;
use crate::transform::{grouped_mean, round_retention, split_categories, Category};
use crate::validation::is_allowed_extension;

pub use locks::{KeyGuard, KeyLocks};
pub use state::{WorkflowStage, WorkflowStatus};

/// A transform step that can be requested for an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Filter,
    Round,
    Mean,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Filter => "filter",
            Step::Round => "round",
            Step::Mean => "mean",
        };
        f.write_str(name)
    }
}

/// Files written by one step, in a fixed order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutput {
    pub step: Step,
    pub files: Vec<StoredFile>,
}

/// Runs workflow steps against the configured storage roots.
#[derive(Debug)]
pub struct Workflow {
    storage: StorageConfig,
    locks: KeyLocks,
}

impl Workflow {
    /// Create the workflow, creating both storage directories if needed.
    pub fn new(storage: StorageConfig) -> WorkflowResult<Self> {
        storage.ensure_dirs()?;
        Ok(Self {
            storage,
            locks: KeyLocks::new(),
        })
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    /// Store an uploaded spreadsheet for `caller`.
    ///
    /// The extension is checked before anything touches the disk.
    /// Uploading the same filename again replaces the previous copy.
    pub fn upload(&self, caller: &str, filename: &str, bytes: &[u8]) -> WorkflowResult<StoredFile> {
        if !is_allowed_extension(filename) {
            log_warning(format!("Rejected upload with invalid extension: {}", filename));
            return Err(WorkflowError::InvalidExtension(filename.to_string()));
        }

        let key = build_key(caller, filename)?;
        let _guard = self.locks.acquire(&key);

        let path = self.storage.upload_dir.join(key.as_str());
        sheet::write_atomic(&path, bytes)?;
        log_success(format!("Stored upload {} ({} bytes)", key, bytes.len()));

        Ok(StoredFile {
            path,
            display_name: filename.to_string(),
        })
    }

    /// Run `step` for `caller`'s `filename`.
    pub fn run(&self, step: Step, caller: &str, filename: &str) -> WorkflowResult<StepOutput> {
        match step {
            Step::Filter => self.filter(caller, filename),
            Step::Round => self.round(caller, filename),
            Step::Mean => self.mean(caller, filename),
        }
    }

    /// Split the upload into PC, LPC and plasmalogen files.
    pub fn filter(&self, caller: &str, filename: &str) -> WorkflowResult<StepOutput> {
        let key = build_key(caller, filename)?;
        let upload = self.upload_path(&key)?;
        let _guard = self.locks.acquire(&key);

        let table = self.load_upload(&upload, &key)?;
        let split = split_categories(&table)?;

        // Serialize every subset before touching the disk
        let encoded = Category::ALL
            .iter()
            .map(|category| -> WorkflowResult<(Stage, Vec<u8>)> {
                let subset = split.get(*category);
                log_info_indent(
                    format!("{}: {} rows", category.stage().prefix().trim_end_matches('_'), subset.row_count()),
                    1,
                );
                Ok((category.stage(), sheet::to_bytes(subset)?))
            })
            .collect::<WorkflowResult<Vec<_>>>()?;

        let mut files: Vec<StoredFile> = Vec::with_capacity(encoded.len());
        for (stage, bytes) in encoded {
            let file = self.stage_file(&key, stage);
            if let Err(e) = sheet::write_atomic(&file.path, &bytes) {
                for written in &files {
                    let _ = fs::remove_file(&written.path);
                }
                return Err(e.into());
            }
            files.push(file);
        }

        log_success(format!("Filtered {} into {} files", key, files.len()));
        Ok(StepOutput {
            step: Step::Filter,
            files,
        })
    }

    /// Add the rounded retention-time column to the upload.
    pub fn round(&self, caller: &str, filename: &str) -> WorkflowResult<StepOutput> {
        let key = build_key(caller, filename)?;
        let upload = self.upload_path(&key)?;
        let _guard = self.locks.acquire(&key);

        let table = self.load_upload(&upload, &key)?;
        let rounded = round_retention(&table)?;
        let file = self.save_stage(&key, Stage::RoundoffRetention, &rounded)?;

        log_success(format!("Rounded retention time for {} rows", rounded.row_count()));
        Ok(StepOutput {
            step: Step::Round,
            files: vec![file],
        })
    }

    /// Average the rounded file per retention time.
    ///
    /// Requires both the upload and a previous [`Workflow::round`] for the same key.
    pub fn mean(&self, caller: &str, filename: &str) -> WorkflowResult<StepOutput> {
        let key = build_key(caller, filename)?;
        self.upload_path(&key)?;

        let rounded_path = resolve(&key.staged(Stage::RoundoffRetention), &self.storage.download_dir)
            .map_err(|_| {
                WorkflowError::PreconditionNotMet(format!(
                    "retention time has not been rounded for {}",
                    key.filename()
                ))
            })?;
        let _guard = self.locks.acquire(&key);

        log_info(format!("Processing your file: {}", key));
        let table = sheet::load(&rounded_path)?;
        let means = grouped_mean(&table)?;
        let file = self.save_stage(&key, Stage::MeanDataFrame, &means)?;

        log_success(format!(
            "{} retention-time groups from {} rows",
            means.row_count(),
            table.row_count()
        ));
        Ok(StepOutput {
            step: Step::Mean,
            files: vec![file],
        })
    }

    /// Progress of `caller`'s `filename`, derived from storage.
    pub fn status(&self, caller: &str, filename: &str) -> WorkflowResult<WorkflowStatus> {
        let key = build_key(caller, filename)?;
        Ok(WorkflowStatus::derive(&key, &self.storage))
    }

    /// Location of the upload for `key`. Checked before any lock is taken.
    fn upload_path(&self, key: &StorageKey) -> WorkflowResult<PathBuf> {
        resolve(key.as_str(), &self.storage.upload_dir)
            .map_err(|_| WorkflowError::FileNotFound(key.filename().to_string()))
    }

    fn load_upload(&self, path: &Path, key: &StorageKey) -> WorkflowResult<Table> {
        log_info(format!("Processing your file: {}", key));
        Ok(sheet::load(path)?)
    }

    fn stage_file(&self, key: &StorageKey, stage: Stage) -> StoredFile {
        StoredFile {
            path: self.storage.download_dir.join(key.staged(stage)),
            display_name: key.display_name(stage),
        }
    }

    fn save_stage(&self, key: &StorageKey, stage: Stage, table: &Table) -> WorkflowResult<StoredFile> {
        let file = self.stage_file(key, stage);
        sheet::save(table, &file.path)?;
        Ok(file)
    }
}
