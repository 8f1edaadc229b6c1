use thiserror::Error;

/// Raised when a replicated-state value does not match any [`crate::domain::Answer`]
/// wire literal. Unrelated apps may share the key namespace, so callers treat
/// this as "no answer" rather than a fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized answer literal: {0:?}")]
pub struct AnswerParseError(pub String);
