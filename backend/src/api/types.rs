//! REST API response types and error-to-status mapping.
//!
//! Error bodies are plain text. Each failure maps to one status code:
//!
//! | Failure                                  | Status |
//! |------------------------------------------|--------|
//! | Upload extension is not `xlsx`           | 422    |
//! | Input file never uploaded                | 422    |
//! | Required column missing / bad request    | 400    |
//! | Mean requested before rounding           | 432    |
//! | Unreadable spreadsheet, IO failure       | 500    |

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::logs::log_error;
use crate::error::{IdentityError, ServerError, TransformError, WorkflowError};
use crate::models::columns::{COMPOUND_ID, RETENTION_ROUNDOFF, RETENTION_TIME};
use crate::workflow::{Step, WorkflowStatus};

/// Non-standard status returned when the mean step runs before rounding.
pub const PRECONDITION_STATUS: u16 = 432;

pub const UPLOAD_OK: &str = "Upload completed successfully";
pub const UPLOAD_FAILED: &str = "Unable to upload file. Please try again";
pub const INVALID_EXTENSION: &str = "Invalid extension found";
pub const ROUND_FIRST: &str = "Complete the second task first";

/// Body of `GET /status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub caller: String,
    #[serde(flatten)]
    pub status: WorkflowStatus,
}

impl ServerError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Workflow(error) | ServerError::Step { error, .. } => workflow_status(error),
        }
    }

    /// Short plain-text message sent to the client.
    pub fn client_message(&self) -> String {
        match self {
            ServerError::BadRequest(msg) => msg.clone(),
            ServerError::Internal(_) => "Internal server error".to_string(),
            ServerError::Workflow(WorkflowError::InvalidExtension(_)) => INVALID_EXTENSION.to_string(),
            ServerError::Workflow(error) => workflow_message(error),
            ServerError::Step { step, error } => step_message(*step, error),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log_error(self.to_string());
        }
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.client_message(),
        )
            .into_response()
    }
}

fn workflow_status(error: &WorkflowError) -> StatusCode {
    match error {
        WorkflowError::InvalidExtension(_) | WorkflowError::FileNotFound(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        WorkflowError::PreconditionNotMet(_) => {
            StatusCode::from_u16(PRECONDITION_STATUS).unwrap_or(StatusCode::BAD_REQUEST)
        }
        WorkflowError::Identity(IdentityError::NotFound(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        WorkflowError::Identity(IdentityError::Invalid(_)) | WorkflowError::Transform(_) => {
            StatusCode::BAD_REQUEST
        }
        WorkflowError::Sheet(_) | WorkflowError::Bundle(_) | WorkflowError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn workflow_message(error: &WorkflowError) -> String {
    match error {
        WorkflowError::Sheet(_) | WorkflowError::Bundle(_) | WorkflowError::Io(_) => {
            "Internal server error".to_string()
        }
        other => other.to_string(),
    }
}

fn step_message(step: Step, error: &WorkflowError) -> String {
    match (step, error) {
        (Step::Filter, WorkflowError::FileNotFound(_)) => {
            "File is not present in server. Please upload your file first".to_string()
        }
        (_, WorkflowError::FileNotFound(_)) => "Query file not found in server".to_string(),
        (_, WorkflowError::PreconditionNotMet(_)) => ROUND_FIRST.to_string(),
        (_, WorkflowError::Transform(TransformError::MissingColumn(column))) => {
            missing_column_message(column)
        }
        (_, other) => workflow_message(other),
    }
}

fn missing_column_message(column: &str) -> String {
    match column {
        COMPOUND_ID => format!("Column {} does not exist in your file", COMPOUND_ID),
        RETENTION_TIME => "Column Retention Time does not exist in file".to_string(),
        RETENTION_ROUNDOFF => format!("Column {} does not exist in file", RETENTION_ROUNDOFF),
        other => format!("Column {} does not exist in file", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SheetError;

    fn step_error(step: Step, error: WorkflowError) -> ServerError {
        ServerError::Step { step, error }
    }

    #[test]
    fn test_not_found_messages_per_step() {
        let filter = step_error(Step::Filter, WorkflowError::FileNotFound("a.xlsx".into()));
        assert_eq!(filter.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            filter.client_message(),
            "File is not present in server. Please upload your file first"
        );

        let mean = step_error(Step::Mean, WorkflowError::FileNotFound("a.xlsx".into()));
        assert_eq!(mean.client_message(), "Query file not found in server");
    }

    #[test]
    fn test_precondition_uses_432() {
        let err = step_error(Step::Mean, WorkflowError::PreconditionNotMet("x".into()));
        assert_eq!(err.status_code().as_u16(), 432);
        assert_eq!(err.client_message(), ROUND_FIRST);
    }

    #[test]
    fn test_missing_column_is_bad_request() {
        let err = step_error(
            Step::Filter,
            TransformError::MissingColumn(COMPOUND_ID.into()).into(),
        );
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.client_message(),
            "Column Accepted Compound ID does not exist in your file"
        );

        let err = step_error(
            Step::Round,
            TransformError::MissingColumn(RETENTION_TIME.into()).into(),
        );
        assert_eq!(err.client_message(), "Column Retention Time does not exist in file");
    }

    #[test]
    fn test_invalid_extension() {
        let err = ServerError::from(WorkflowError::InvalidExtension("a.csv".into()));
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.client_message(), INVALID_EXTENSION);
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = step_error(
            Step::Round,
            SheetError::Parse("invalid zip header".into()).into(),
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "Internal server error");
    }
}
