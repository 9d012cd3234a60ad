use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Every way a scoring request can fail. Each variant maps to exactly one
/// HTTP status and one caller-facing message.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Invalid query string: {0}")]
    InvalidQuery(String),

    #[error("Missing parameters: {}", .0.join(", "))]
    MissingParameters(Vec<&'static str>),

    #[error("Invalid quantity. It must be an integer.")]
    InvalidQuantity,

    #[error("Invalid schedule_date format. Use 'YYYY-MM-DD'.")]
    InvalidScheduleDate,

    #[error("Input payload contains invalid values.")]
    InvalidFeatureValues,

    #[error("Model file not found.")]
    ModelNotFound(PathBuf),

    // detail goes to the log only
    #[error("Model could not be loaded.")]
    ModelLoad(String),

    #[error("Model expects features the request does not provide: {}", .0.join(", "))]
    SchemaMismatch(Vec<String>),

    #[error("Error during prediction: {0}")]
    Prediction(String),
}

impl ScoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            ScoreError::InvalidQuery(_)
            | ScoreError::MissingParameters(_)
            | ScoreError::InvalidQuantity
            | ScoreError::InvalidScheduleDate
            | ScoreError::InvalidFeatureValues => StatusCode::BAD_REQUEST,
            ScoreError::ModelNotFound(_)
            | ScoreError::ModelLoad(_)
            | ScoreError::SchemaMismatch(_)
            | ScoreError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ScoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
