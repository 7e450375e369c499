//! Fetch error taxonomy shared by the pool and price clients

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single outbound fetch.
///
/// Clients raise these; the refresh scheduler decides what to do with them
/// (see [`crate::policy`]). The aggregator never sees one.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure: DNS, connect, timeout, or a body that could not be read
    #[error("{resource}: request failed: {message}")]
    Network { resource: String, message: String },

    /// Non-2xx response
    #[error("{resource}: http {status}: {body}")]
    HttpStatus {
        resource: String,
        status: StatusCode,
        body: String,
    },

    /// The pool has no account for this login
    #[error("account {login} not found")]
    NotFound { login: String },

    /// The body parsed but lacked a field we need, or did not parse at all
    #[error("{resource}: malformed response: {message}")]
    Malformed { resource: String, message: String },
}

impl FetchError {
    pub fn network(resource: &str, err: impl std::fmt::Display) -> Self {
        FetchError::Network {
            resource: resource.to_string(),
            message: err.to_string(),
        }
    }

    pub fn malformed(resource: &str, message: impl Into<String>) -> Self {
        FetchError::Malformed {
            resource: resource.to_string(),
            message: message.into(),
        }
    }

    /// Build an [`FetchError::HttpStatus`] from a raw response body
    pub fn http_status(resource: &str, status: StatusCode, body: &[u8]) -> Self {
        let body = String::from_utf8_lossy(body).trim().to_string();
        let body = if body.is_empty() {
            "<empty>".to_string()
        } else if body.len() > 200 {
            let mut end = 200;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &body[..end])
        } else {
            body
        };

        FetchError::HttpStatus {
            resource: resource.to_string(),
            status,
            body,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}
