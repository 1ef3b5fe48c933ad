//! Service errors and their HTTP problem responses

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::routes::CHAT_PATH;

/// Failure talking to the text generation API
#[derive(Error, Debug)]
pub enum GenerationError {
    /// No API key configured
    #[error("No API key configured for the generation API")]
    MissingApiKey,

    /// Transport or decoding failure
    #[error("Generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-success status
    #[error("Generation API returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// API answered without any completion text
    #[error("Generation API returned no completion")]
    EmptyResponse,
}

/// Errors surfaced by the chat route
#[derive(Error, Debug)]
pub enum ApiError {
    /// Client address is not whitelisted
    #[error("IP address [{addr}] is not allowed to access this service")]
    AccessDenied {
        /// Candidate address that was rejected
        addr: String,
    },

    /// Text generation failed
    #[error("AI service call failed: {0}")]
    Generation(#[from] GenerationError),
}

/// RFC 7807 problem body
#[derive(Debug, Serialize)]
pub struct ProblemDetail {
    /// Problem type URI
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Short summary
    pub title: &'static str,
    /// HTTP status code
    pub status: u16,
    /// Human-readable explanation
    pub detail: String,
    /// Request path
    pub instance: &'static str,
    /// Underlying failure, when there is one worth showing
    #[serde(rename = "errorDetails", skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::AccessDenied { .. } => StatusCode::FORBIDDEN,
            Self::Generation(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Problem body for this error
    pub fn problem(&self) -> ProblemDetail {
        let status = self.status().as_u16();
        match self {
            Self::AccessDenied { .. } => ProblemDetail {
                kind: "about:blank",
                title: "Access Denied",
                status,
                detail: self.to_string(),
                instance: CHAT_PATH,
                error_details: None,
            },
            Self::Generation(_) => ProblemDetail {
                kind: "about:blank",
                title: "Service Unavailable",
                status,
                detail: "AI service is temporarily unavailable".to_string(),
                instance: CHAT_PATH,
                error_details: Some(self.to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::AccessDenied { addr } => warn!(addr = %addr, "Rejected request"),
            Self::Generation(e) => error!(error = %e, "Generation failed"),
        }

        let mut response = (self.status(), Json(self.problem())).into_response();
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}
