//! Crate-wide application error with an axum `IntoResponse` mapping.
//!
//! `Unauthorized` carries the exact plain-text body the gate wants to send;
//! the message format is decided where the rejection happens, not here.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorResponseBody {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // Auth rejections are plain text so the client sees the message
            // verbatim (token error name, or an embedded error claim).
            AppError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, message).into_response()
            }
            AppError::Config(e) => {
                let body = ErrorResponseBody {
                    error: ErrorBody {
                        code: "CONFIG",
                        message: e.to_string(),
                    },
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
            AppError::Internal => {
                let body = ErrorResponseBody {
                    error: ErrorBody {
                        code: "INTERNAL",
                        message: "internal server error".to_string(),
                    },
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}
