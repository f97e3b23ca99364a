use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Driver error: {0}")]
    Driver(#[from] mongodb::error::Error),

    #[error("Malformed document: {0}")]
    Decode(String),

    #[error("Unsupported value: {0}")]
    Encode(String),

    #[error("Cannot set a field under {0}")]
    PathConflict(String),

    #[error("Malformed identifier: {0}")]
    InvalidId(String),

    #[error("Store unavailable")]
    Unavailable,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid stock value")]
    InvalidStock,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Any store failure. Only `context` reaches the caller.
    #[error("{context}")]
    Internal {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl AppError {
    pub fn internal(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| AppError::Internal { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidStock => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // 400/404 answer with a "message", everything else with an "error"
        let body = match &self {
            AppError::InvalidStock | AppError::NotFound(_) => {
                json!({ "message": self.to_string() })
            }
            AppError::InvalidCredentials => json!({ "error": self.to_string() }),
            AppError::Internal { context, source } => {
                error!(error = %source, "{context}");
                json!({ "error": context })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Invalid {key} value: {reason}")]
    Config { key: &'static str, reason: String },

    #[error("Could not reach the database: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}
