//! Adapters between HTTP responses and the retry loop
//!
//! The retry loop only needs a status code from each attempt. Anything that
//! can report one implements [`StatusCoded`]: raw `reqwest` responses, bare
//! status codes, and [`ApiResponse`] for calls whose body has already been
//! decoded.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::BoxError;

/// A response that exposes an HTTP status code
pub trait StatusCoded {
    fn status_code(&self) -> StatusCode;
}

impl StatusCoded for StatusCode {
    fn status_code(&self) -> StatusCode {
        *self
    }
}

impl StatusCoded for reqwest::Response {
    fn status_code(&self) -> StatusCode {
        self.status()
    }
}

/// A status code paired with a decoded body
///
/// The body is only decoded for successful responses. Error answers such as
/// a 409 usually carry an error document that would not decode into `T`, and
/// they must still reach the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub body: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn new(status: StatusCode, body: Option<T>) -> Self {
        Self { status, body }
    }
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Read and decode a `reqwest` response
    ///
    /// Empty bodies and non-2xx answers produce `body: None`.
    pub async fn read(response: reqwest::Response) -> std::result::Result<Self, BoxError> {
        let status = response.status();
        let bytes = response.bytes().await?;

        let body = if status.is_success() && !bytes.is_empty() {
            Some(serde_json::from_slice(&bytes)?)
        } else {
            None
        };

        Ok(Self { status, body })
    }
}

impl<T> StatusCoded for ApiResponse<T> {
    fn status_code(&self) -> StatusCode {
        self.status
    }
}
