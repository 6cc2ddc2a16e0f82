//! error.rs
//!
//! Общий тип ошибок приложения и его преобразование в HTTP-ответ.
//!
//! Таксономия:
//! - NotFound (404) - запись с указанным ID отсутствует;
//! - Validation (400) - некорректные параметры формы или запроса;
//! - Database / Internal (500) - всё остальное, включая нарушения
//!   ограничений БД (уникальность телефона/почты не транслируется
//!   в доменную ошибку).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(detail) => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": detail }))).into_response()
            }
            AppError::Validation(detail) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail }))).into_response()
            }
            // Ответ 500 с цепочкой ошибки - поведение для разработки,
            // не боевой контракт
            AppError::Database(ref err) => {
                tracing::error!("database error: {:?}", err);
                internal_error_response(err.to_string(), format!("{:?}", err))
            }
            AppError::Internal(ref err) => {
                tracing::error!("internal error: {:?}", err);
                let chain = format!("{:?}", err);
                internal_error_response(err.to_string(), chain)
            }
        }
    }
}

fn internal_error_response(error: String, stack_trace: String) -> Response {
    let error_line = stack_trace
        .lines()
        .last()
        .unwrap_or_default()
        .trim()
        .to_string();
    let body = Json(json!({
        "detail": "Internal Server Error",
        "error": error,
        "error_line": error_line,
        "stack_trace": stack_trace,
    }));
    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
}

pub type AppResult<T> = Result<T, AppError>;
