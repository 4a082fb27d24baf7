use axum::extract::multipart::MultipartError;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hoard_protocol::{ErrorBody, ProtocolError};
use hoard_sdk::SdkError;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("no such route")]
    RouteNotFound,

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    Protocol(#[from] ProtocolError),

    #[error("{0}")]
    Sdk(#[from] SdkError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status this error is reported with.
    ///
    /// Rejected hash claims and malformed request input are client faults
    /// (400), not server errors. Only an id that parses but names no stored
    /// blob is a 404.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Protocol(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RouteNotFound | Self::Sdk(SdkError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Sdk(SdkError::HashMismatch { .. }) | Self::Sdk(SdkError::Protocol(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Sdk(_) | Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<MultipartError> for ServerError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(e.body_text())
        } else {
            Self::Protocol(ProtocolError::Multipart(e.body_text()))
        }
    }
}

impl From<QueryRejection> for ServerError {
    fn from(e: QueryRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        let body = ErrorBody::new(status.as_u16(), self.to_string());
        (status, Json(body)).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
