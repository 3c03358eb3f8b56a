//! # Metaboflow - lipid measurement spreadsheet workflow
//!
//! Metaboflow stores uploaded `.xlsx` measurement sheets and runs three
//! transformations on them: splitting rows by compound class, rounding
//! retention time, and averaging every column per rounded retention time.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  xlsx File  │────▶│  Identity   │────▶│  Transform  │────▶│  xlsx + zip │
//! │  (upload)   │     │ (key+store) │     │ (split/avg) │     │  (outputs)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use metaboflow::{StorageConfig, Workflow};
//!
//! let workflow = Workflow::new(StorageConfig::default())?;
//! workflow.upload("alice", "lipids.xlsx", &std::fs::read("lipids.xlsx")?)?;
//! let output = workflow.filter("alice", "lipids.xlsx")?;
//! println!("Wrote {} files", output.files.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Table, Cell and stage prefixes
//! - [`sheet`] - xlsx reading and writing
//! - [`identity`] - Storage keys and file lookup
//! - [`validation`] - Extension and column checks
//! - [`transform`] - Category split, rounding and grouped mean
//! - [`workflow`] - Step orchestration and progress
//! - [`bundle`] - Zip bundling of step outputs
//! - [`config`] - Storage and server settings
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Storage
pub mod identity;
pub mod sheet;

// Transformation
pub mod transform;
pub mod validation;

// Orchestration
pub mod bundle;
pub mod workflow;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    BundleError,
    IdentityError,
    ServerError,
    SheetError,
    TableError,
    TransformError,
    WorkflowError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{columns, Cell, Stage, Table};

// =============================================================================
// Re-exports - Storage
// =============================================================================

pub use config::{ServerConfig, StorageConfig};
pub use identity::{build_key, resolve, StorageKey, StoredFile};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    grouped_mean,
    round_retention,
    round_to_nearest,
    split_categories,
    Category,
    CategorySplit,
};

// =============================================================================
// Re-exports - Workflow
// =============================================================================

pub use bundle::{zip_files, BUNDLE_NAME};
pub use workflow::{Step, StepOutput, Workflow, WorkflowStage, WorkflowStatus};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
