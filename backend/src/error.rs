use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// A single rejected field in a create / update payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Validation error: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Invalid date format for {field}: {value:?} (expected YYYY-MM-DD)")]
    DateFormat { field: String, value: String },

    #[error("Invalid assignment ID: {0}")]
    InvalidId(String),

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::DateFormat { .. }
            | AppError::InvalidId(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Migrate(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, fields) = match self {
            AppError::NotFound => ("Assignment not found".to_string(), Vec::new()),
            AppError::Validation(fields) => {
                warn!("rejected payload: {}", join_fields(&fields));
                ("Validation error".to_string(), fields)
            }
            AppError::DateFormat { field, value } => {
                let message = format!("Invalid date format for {field}: {value:?} (expected YYYY-MM-DD)");
                warn!("{}", message);
                (message, vec![FieldError::new(field, "invalid date format")])
            }
            AppError::InvalidId(id) => (format!("Invalid assignment ID: {}", id), Vec::new()),
            AppError::BadRequest(msg) => (msg, Vec::new()),
            AppError::Database(e) => {
                error!("database error: {}", e);
                ("Database error occurred".to_string(), Vec::new())
            }
            AppError::Migrate(e) => {
                error!("migration error: {}", e);
                ("Database error occurred".to_string(), Vec::new())
            }
            AppError::Config(msg) => {
                error!("configuration error: {}", msg);
                ("Internal server error".to_string(), Vec::new())
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message,
            fields,
        });

        (status, body).into_response()
    }
}
