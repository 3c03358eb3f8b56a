//! Workflow progress, derived from which stored files exist.
//!
//! Nothing is recorded besides the files themselves: a key's stage can
//! always be recomputed from the two storage directories.

use serde::Serialize;

use crate::config::StorageConfig;
use crate::identity::{resolve, StorageKey};
use crate::models::Stage;
use crate::transform::Category;

/// Furthest point a key has reached.
///
/// `Filtered` and `Rounded` are independent branches after `Uploaded`;
/// only `Rounded` leads on to `Meaned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowStage {
    NotUploaded,
    Uploaded,
    Filtered,
    Rounded,
    Meaned,
}

/// Which artifacts exist for one `(caller, filename)` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStatus {
    pub filename: String,
    pub uploaded: bool,
    /// All three category files are present.
    pub filtered: bool,
    pub rounded: bool,
    pub meaned: bool,
    pub stage: WorkflowStage,
}

impl WorkflowStatus {
    /// Inspect the storage directories for `key`.
    pub fn derive(key: &StorageKey, storage: &StorageConfig) -> Self {
        let exists = |stage: Stage| resolve(&key.staged(stage), &storage.download_dir).is_ok();

        let uploaded = resolve(key.as_str(), &storage.upload_dir).is_ok();
        let filtered = Category::ALL.iter().all(|c| exists(c.stage()));
        let rounded = exists(Stage::RoundoffRetention);
        let meaned = exists(Stage::MeanDataFrame);

        let stage = if !uploaded {
            WorkflowStage::NotUploaded
        } else if meaned {
            WorkflowStage::Meaned
        } else if rounded {
            WorkflowStage::Rounded
        } else if filtered {
            WorkflowStage::Filtered
        } else {
            WorkflowStage::Uploaded
        };

        Self {
            filename: key.filename().to_string(),
            uploaded,
            filtered,
            rounded,
            meaned,
            stage,
        }
    }
}
