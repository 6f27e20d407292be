//! Check outcomes and the error taxonomy that feeds them.
//!
//! Every check either produces an [`Outcome`] directly or fails with a
//! [`CheckError`]. The error is converted into a Failure outcome at the check
//! boundary, so nothing raised inside a check ever reaches the orchestrator.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest response-body excerpt carried in error messages.
pub const BODY_EXCERPT_LIMIT: usize = 512;

/// Structured context attached to a non-successful outcome.
pub type Detail = BTreeMap<String, String>;

/// Classification of a single check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Warning,
    Failure,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "✅ PASS"),
            Self::Warning => write!(f, "⚠️  WARN"),
            Self::Failure => write!(f, "❌ FAIL"),
        }
    }
}

/// The result of one check.
///
/// `Success` carries nothing; the other two always carry a human-readable
/// message and optional structured detail (offending object name, id, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Warning { message: String, detail: Detail },
    Failure { message: String, detail: Detail },
}

impl Outcome {
    pub fn success() -> Self {
        Self::Success
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning {
            message: non_empty(message.into()),
            detail: Detail::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: non_empty(message.into()),
            detail: Detail::new(),
        }
    }

    /// Attach a piece of context. Has no effect on `Success`.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Warning { detail, .. } | Self::Failure { detail, .. } = &mut self {
            detail.insert(key.into(), value.into());
        }
        self
    }

    pub fn status(&self) -> OutcomeStatus {
        match self {
            Self::Success => OutcomeStatus::Success,
            Self::Warning { .. } => OutcomeStatus::Warning,
            Self::Failure { .. } => OutcomeStatus::Failure,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Warning { message, .. } | Self::Failure { message, .. } => Some(message),
        }
    }

    pub fn detail(&self) -> Option<&Detail> {
        match self {
            Self::Success => None,
            Self::Warning { detail, .. } | Self::Failure { detail, .. } => Some(detail),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

fn non_empty(message: String) -> String {
    if message.trim().is_empty() {
        "check reported a problem without a description".to_string()
    } else {
        message
    }
}

/// Errors raised while a check is running.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The endpoint or the cluster API could not be reached, or the response
    /// could not be read.
    #[error("failed to reach {target}: {reason}")]
    Transport { target: String, reason: String },

    /// The endpoint answered with a non-2xx status.
    #[error("received non-successful HTTP status: {status}. Body: {body}")]
    HttpStatus { status: String, body: String },

    /// The session credential was missing or rejected.
    #[error("authentication rejected by {target}: {reason}")]
    Authentication { target: String, reason: String },

    /// The body is not valid JSON.
    #[error("failed to parse JSON response: {reason}. Body: {excerpt}")]
    MalformedPayload { reason: String, excerpt: String },

    /// The JSON decoded but a field is absent or has the wrong shape.
    #[error("unexpected JSON structure at '{path}': expected {expected}, found {found}")]
    SchemaMismatch {
        path: String,
        expected: &'static str,
        found: String,
    },

    /// The payload is well formed but the observed value breaks the check's rule.
    #[error("{subject}: expected {expected}, got '{observed}'")]
    PolicyViolation {
        subject: String,
        observed: String,
        expected: String,
    },
}

impl CheckError {
    pub fn transport(target: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Transport {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    pub fn violation(
        subject: impl Into<String>,
        observed: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::PolicyViolation {
            subject: subject.into(),
            observed: observed.into(),
            expected: expected.into(),
        }
    }

    /// Short machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::HttpStatus { .. } => "http_status",
            Self::Authentication { .. } => "authentication",
            Self::MalformedPayload { .. } => "malformed_payload",
            Self::SchemaMismatch { .. } => "schema_mismatch",
            Self::PolicyViolation { .. } => "policy_violation",
        }
    }
}

impl From<CheckError> for Outcome {
    fn from(err: CheckError) -> Self {
        let outcome = Outcome::failure(err.to_string()).with_detail("error", err.kind());
        match err {
            CheckError::SchemaMismatch { path, .. } => outcome.with_detail("path", path),
            CheckError::PolicyViolation {
                subject, observed, ..
            } => outcome
                .with_detail("subject", subject)
                .with_detail("observed", observed),
            CheckError::HttpStatus { status, .. } => outcome.with_detail("status", status),
            _ => outcome,
        }
    }
}

/// Bounded excerpt of a response body for diagnostics.
pub fn excerpt(body: &str) -> String {
    match body.char_indices().nth(BODY_EXCERPT_LIMIT) {
        Some((cut, _)) => format!("{}...(truncated)", &body[..cut]),
        None => body.to_string(),
    }
}
