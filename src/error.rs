//! Unified application error model and mapping helpers.
//! One error enum is shared by the storage layer, the list engine and the HTTP
//! frontend, along with the mapping to HTTP status codes and response bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// The transport input could not be turned into a typed request.
    UserInput { code: String, message: String },
    NotFound { code: String, message: String },
    /// Any storage-layer failure other than a missing record.
    Backend { code: String, message: String },
    /// A request was wired with a value shape its strategy cannot handle.
    Contract { code: String, message: String },
    Cancelled { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Backend { code, .. }
            | AppError::Contract { code, .. }
            | AppError::Cancelled { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Backend { message, .. }
            | AppError::Contract { message, .. }
            | AppError::Cancelled { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn backend<S: Into<String>>(code: S, msg: S) -> Self { AppError::Backend { code: code.into(), message: msg.into() } }
    pub fn contract<S: Into<String>>(code: S, msg: S) -> Self { AppError::Contract { code: code.into(), message: msg.into() } }
    pub fn cancelled<S: Into<String>>(code: S, msg: S) -> Self { AppError::Cancelled { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::NotFound { .. } => 404,
            AppError::Backend { .. } => 503,
            AppError::Contract { .. } => 500,
            // nginx-style "client closed request"
            AppError::Cancelled { .. } => 499,
            AppError::Internal { .. } => 500,
        }
    }

    pub fn is_not_found(&self) -> bool { matches!(self, AppError::NotFound { .. }) }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Backend { code: "serialization".into(), message: err.to_string() }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Keep typed errors that travelled through anyhow; everything else is internal
        match err.downcast::<AppError>() {
            Ok(app) => app,
            Err(other) => AppError::Internal { code: "internal".into(), message: other.to_string() },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({
            "status": "error",
            "code": self.code_str(),
            "message": self.message(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(AppError::user("bad_input", "oops").http_status(), 400);
        assert_eq!(AppError::not_found("not_found", "missing").http_status(), 404);
        assert_eq!(AppError::backend("io", "disk").http_status(), 503);
        assert_eq!(AppError::contract("unfilterable", "raw").http_status(), 500);
        assert_eq!(AppError::cancelled("cancelled", "gone").http_status(), 499);
        assert_eq!(AppError::internal("internal", "panic").http_status(), 500);
    }

    #[test]
    fn display_joins_code_and_message() {
        let e = AppError::not_found("not_found", "no role r1");
        assert_eq!(e.to_string(), "not_found: no role r1");
        assert!(e.is_not_found());
        assert!(!AppError::user("x", "y").is_not_found());
    }

    #[test]
    fn serde_errors_map_to_backend() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let app: AppError = err.into();
        assert_eq!(app.code_str(), "serialization");
        assert_eq!(app.http_status(), 503);
    }

    #[test]
    fn anyhow_preserves_typed_errors() {
        let wrapped = anyhow::Error::new(AppError::not_found("not_found", "gone"));
        let back: AppError = wrapped.into();
        assert!(back.is_not_found());

        let plain: AppError = anyhow::anyhow!("boom").into();
        assert_eq!(plain.code_str(), "internal");
    }

    #[test]
    fn serializes_with_type_tag() {
        let v = serde_json::to_value(AppError::user("bad_id", "id mismatch")).unwrap();
        assert_eq!(v["type"], "user_input");
        assert_eq!(v["code"], "bad_id");
    }
}
