//! Status classification for mutating operations
//!
//! Both the "done" and the "try again" codes are explicit allow-lists. A code
//! that is in neither list fails immediately instead of being retried, so a
//! validation error never shows up as a slow create.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{BoxError, ConvergeError};
use crate::http::StatusCoded;

/// An ordered set of HTTP status codes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCodes(BTreeSet<u16>);

impl StatusCodes {
    /// Returns true if `code` is a member of the set
    #[must_use]
    pub fn contains(&self, code: StatusCode) -> bool {
        self.0.contains(&code.as_u16())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if no code appears in both sets
    #[must_use]
    pub fn is_disjoint(&self, other: &StatusCodes) -> bool {
        self.0.is_disjoint(&other.0)
    }

    /// Raw codes, in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<StatusCode> for StatusCodes {
    fn from_iter<I: IntoIterator<Item = StatusCode>>(iter: I) -> Self {
        Self(iter.into_iter().map(|code| code.as_u16()).collect())
    }
}

impl fmt::Display for StatusCodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, code) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", code)?;
        }
        write!(f, "]")
    }
}

/// Which status codes end a retry loop and which ones keep it going
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePolicy {
    /// Codes that mean the operation is done
    pub stop: StatusCodes,
    /// Codes that mean "try again after the delay"
    pub retry: StatusCodes,
}

impl CodePolicy {
    pub fn new(
        stop: impl IntoIterator<Item = StatusCode>,
        retry: impl IntoIterator<Item = StatusCode>,
    ) -> Self {
        Self {
            stop: stop.into_iter().collect(),
            retry: retry.into_iter().collect(),
        }
    }

    /// Policy for create calls: 201 is done, 409/424 are transient
    pub fn create() -> Self {
        Self::new(
            [StatusCode::CREATED],
            [StatusCode::CONFLICT, StatusCode::FAILED_DEPENDENCY],
        )
    }

    /// Policy for delete calls: 204 (and 201) are done, 409/424 are transient
    ///
    /// 201 is accepted for deletes because the control plane has been
    /// observed to answer that way; override `[delete] stop` to tighten it.
    pub fn delete() -> Self {
        Self::new(
            [StatusCode::NO_CONTENT, StatusCode::CREATED],
            [StatusCode::CONFLICT, StatusCode::FAILED_DEPENDENCY],
        )
    }
}

/// Outcome of classifying one attempt
#[derive(Debug)]
pub enum Decision<R> {
    /// Stop: the response is final
    Succeed(R),
    /// Stop: the operation failed and must not be retried
    FailPermanently(ConvergeError),
    /// Keep going after the given delay
    RetryAfter(Duration),
}

impl<R> Decision<R> {
    #[must_use]
    pub fn is_retry(&self) -> bool {
        matches!(self, Decision::RetryAfter(_))
    }
}

/// Classify the outcome of a single attempt
///
/// Operation errors are never retried, whatever the status code would have
/// been. Otherwise the status code is looked up in the stop set first, then
/// in the retry set; anything else is a permanent failure that names the
/// code and both sets.
pub fn classify<R: StatusCoded>(
    outcome: std::result::Result<R, BoxError>,
    policy: &CodePolicy,
    delay: Duration,
) -> Decision<R> {
    let response = match outcome {
        Ok(response) => response,
        Err(err) => return Decision::FailPermanently(ConvergeError::Operation(err)),
    };

    let code = response.status_code();
    if policy.stop.contains(code) {
        Decision::Succeed(response)
    } else if policy.retry.contains(code) {
        Decision::RetryAfter(delay)
    } else {
        Decision::FailPermanently(ConvergeError::UnexpectedStatus {
            code,
            stop: policy.stop.clone(),
            retry: policy.retry.clone(),
        })
    }
}
