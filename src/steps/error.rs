//! Step error types

use crate::client::{HttpError, Method};
use thiserror::Error;

/// Error types for step execution
#[derive(Debug, Error)]
pub enum StepError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("error reading service key: {0}")]
    ServiceKey(String),

    #[error("failed to fetch Bearer Token: {0}")]
    Token(String),

    #[error("HTTP {method} request to {url} failed with error: {source}")]
    Http {
        method: Method,
        url: String,
        #[source]
        source: HttpError,
    },

    #[error("{context}, response status code: {status}")]
    UnexpectedStatus {
        context: String,
        status: u16,
        body: String,
    },

    #[error("HTTP response body could not be parsed as JSON: {0}")]
    Json(String),

    #[error("deployment of {artifact_id} failed: {details}")]
    DeploymentFailed { artifact_id: String, details: String },

    #[error("status still pending after retrying {attempts} times")]
    PollExhausted { attempts: u32 },

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StepError {
    pub(crate) fn http(method: Method, url: &str, source: HttpError) -> Self {
        StepError::Http {
            method,
            url: url.to_string(),
            source,
        }
    }

    pub(crate) fn unexpected_status(context: &str, status: u16, body: String) -> Self {
        StepError::UnexpectedStatus {
            context: context.to_string(),
            status,
            body,
        }
    }
}
