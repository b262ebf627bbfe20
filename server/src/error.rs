//! Error types for the registry server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use device_registry::RegistryError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Missing or invalid X-Caller-Address header")]
    MissingCaller,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Registry(err) => match err {
                RegistryError::Unauthorized { .. } => StatusCode::FORBIDDEN,
                RegistryError::UserNotFound(_)
                | RegistryError::DomainNotFound(_)
                | RegistryError::RegistryNotFound(_)
                | RegistryError::DeviceNotFound(_)
                | RegistryError::AppNotFound { .. } => StatusCode::NOT_FOUND,
                RegistryError::UserAlreadyHasRegistry(_)
                | RegistryError::DomainAlreadyRegistered(_)
                | RegistryError::DeviceAlreadyExists(_)
                | RegistryError::ReplayedProof(_) => StatusCode::CONFLICT,
                RegistryError::InvalidPermission(_)
                | RegistryError::InvalidDomain(_)
                | RegistryError::InvalidModel(_) => StatusCode::BAD_REQUEST,
                RegistryError::ProofVerificationFailed(_) => StatusCode::UNAUTHORIZED,
                RegistryError::Ens(_) => StatusCode::BAD_GATEWAY,
            },
            AppError::MissingCaller => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}
