//! Error types for the Metaboflow workflow.
//!
//! This module defines a hierarchy of error types, one per layer:
//!
//! - [`TableError`] - In-memory table shape errors
//! - [`SheetError`] - Spreadsheet reading/writing errors
//! - [`IdentityError`] - Storage key and lookup errors
//! - [`TransformError`] - Category split / rounding / mean errors
//! - [`BundleError`] - Zip bundling errors
//! - [`WorkflowError`] - Step orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::workflow::Step;

// =============================================================================
// Table Errors
// =============================================================================

/// Errors raised when a table would break its shape invariants.
#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    /// A column does not have the same length as the others.
    #[error("Column '{column}' has {found} values, expected {expected}")]
    RaggedColumns {
        column: String,
        expected: usize,
        found: usize,
    },

    /// A column with this name already exists.
    #[error("Column '{0}' already exists")]
    DuplicateColumn(String),
}

// =============================================================================
// Spreadsheet Errors
// =============================================================================

/// Errors while loading or saving a spreadsheet file.
#[derive(Debug, Error)]
pub enum SheetError {
    /// Failed to read or write the file.
    #[error("Spreadsheet IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The workbook could not be parsed.
    #[error("Invalid spreadsheet: {0}")]
    Parse(String),

    /// The workbook could not be serialized.
    #[error("Failed to write spreadsheet: {0}")]
    Write(String),

    /// Parsed content does not form a valid table.
    #[error("Invalid table: {0}")]
    Table(#[from] TableError),
}

impl From<calamine::XlsxError> for SheetError {
    fn from(e: calamine::XlsxError) -> Self {
        SheetError::Parse(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for SheetError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        SheetError::Write(e.to_string())
    }
}

// =============================================================================
// Identity Errors
// =============================================================================

/// Errors from building storage keys or locating stored files.
#[derive(Debug, Error, PartialEq)]
pub enum IdentityError {
    /// Caller id or filename cannot be used as a file name component.
    #[error("Invalid identity: {0}")]
    Invalid(String),

    /// No file with this name exists in the directory.
    #[error("File not found: {0}")]
    NotFound(String),
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors raised by the transform engine.
#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    /// Missing required source column.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A value that must be numeric is not.
    #[error("Non-numeric value in column '{column}' at row {row}")]
    NonNumeric { column: String, row: usize },

    /// Result would not form a valid table.
    #[error("Invalid table: {0}")]
    Table(#[from] TableError),
}

// =============================================================================
// Bundle Errors
// =============================================================================

/// Errors while zipping step outputs.
#[derive(Debug, Error)]
pub enum BundleError {
    /// Failed to read a file being bundled.
    #[error("Bundle IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Zip archive could not be written.
    #[error("Zip error: {0}")]
    Zip(String),
}

impl From<zip::result::ZipError> for BundleError {
    fn from(e: zip::result::ZipError) -> Self {
        BundleError::Zip(e.to_string())
    }
}

// =============================================================================
// Workflow Errors (top-level)
// =============================================================================

/// Step orchestration errors.
///
/// This is the error type returned by every [`crate::workflow::Workflow`] step.
/// It wraps the lower-level errors and adds workflow-specific variants.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Upload does not carry the `xlsx` extension.
    #[error("Invalid extension: {0}")]
    InvalidExtension(String),

    /// Input file was never uploaded.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// A prerequisite step has not run for this key.
    #[error("Precondition not met: {0}")]
    PreconditionNotMet(String),

    /// Storage key error.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Spreadsheet error.
    #[error("Spreadsheet error: {0}")]
    Sheet(#[from] SheetError),

    /// Transformation error.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Bundling error.
    #[error("Bundle error: {0}")]
    Bundle(#[from] BundleError),

    /// IO error outside of spreadsheet handling.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Upload or status error.
    #[error("{0}")]
    Workflow(#[from] WorkflowError),

    /// A transform step failed.
    #[error("{step} step failed: {error}")]
    Step {
        step: Step,
        #[source]
        error: WorkflowError,
    },

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

/// Result type for spreadsheet operations.
pub type SheetResult<T> = Result<T, SheetError>;

/// Result type for transformation operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for workflow steps.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
