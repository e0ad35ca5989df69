//! Check failure taxonomy.
//!
//! Every failed check maps to exactly one `CheckError` variant and is wrapped
//! in an `OracleError` naming the check, so a failing run always says which
//! lifecycle step broke.

use std::fmt;

// ---------------------------------------------------------------------------
// TransportError
// ---------------------------------------------------------------------------

/// A request could not be issued or its response could not be read
/// (connect failure, timeout, broken body). Never retried by the oracle.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{operation}: {message}")]
pub struct TransportError {
    pub operation: String,
    pub message: String,
}

impl TransportError {
    pub fn new(operation: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            operation: operation.into(),
            message: message.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// ModelError
// ---------------------------------------------------------------------------

/// The reference model refused a write. These indicate a sequencing bug in
/// the oracle itself, not a platform defect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("model field `{0}` is already set")]
    AlreadySet(&'static str),

    #[error("model field `{0}` has not been set")]
    Missing(&'static str),

    #[error("player {0} is not in the roster")]
    UnknownPlayer(String),

    #[error("player {0} is already disqualified")]
    AlreadyDisqualified(String),

    #[error("competition {0} is finished; no further scores are accepted")]
    CompetitionFinished(String),
}

// ---------------------------------------------------------------------------
// CheckError
// ---------------------------------------------------------------------------

/// Why a single named check failed.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response code differs from the contractual code.
    #[error("unexpected status code (want: {want}, got: {got})")]
    StatusMismatch { want: u16, got: u16 },

    /// A 2xx body did not parse into the expected payload.
    #[error("malformed response payload: {0}")]
    Decode(String),

    /// A decoded payload failed a domain predicate.
    #[error("{message} (want: {expected}, got: {actual})")]
    InvariantViolation {
        message: String,
        expected: String,
        actual: String,
    },

    /// The run was cancelled or hit its deadline while this check was pending.
    #[error("run cancelled before the check completed")]
    Cancelled,

    /// An account or agent for a role could not be obtained.
    #[error("account provisioning failed: {0}")]
    Provision(String),

    #[error("reference model: {0}")]
    Model(#[from] ModelError),
}

impl CheckError {
    /// Build an `InvariantViolation` from anything displayable.
    pub fn violation(
        message: impl Into<String>,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        Self::InvariantViolation {
            message: message.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Fail with an `InvariantViolation` unless `expected == actual`.
pub fn ensure_eq<T>(message: &str, expected: T, actual: T) -> Result<(), CheckError>
where
    T: PartialEq + fmt::Display,
{
    if expected == actual {
        Ok(())
    } else {
        Err(CheckError::violation(message, expected, actual))
    }
}

// ---------------------------------------------------------------------------
// OracleError
// ---------------------------------------------------------------------------

/// A failed run: the first failing check and why it failed.
#[derive(Debug, thiserror::Error)]
#[error("[{check}] {kind}")]
pub struct OracleError {
    pub check: String,
    #[source]
    pub kind: CheckError,
}

impl OracleError {
    pub fn new(check: impl Into<String>, kind: CheckError) -> Self {
        Self {
            check: check.into(),
            kind,
        }
    }
}
