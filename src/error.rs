//! Error types for the patch-evaluation engine

use thiserror::Error;

/// Errors that prevent an evaluation from producing a result.
///
/// Stage-level failures (patch application, timeouts, infrastructure
/// problems) are reported as flags on the evaluation result, never as
/// errors. The one condition that yields no result at all is a task
/// record the loader cannot make sense of.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("malformed task record: field '{field}': {reason}")]
    MalformedRecord { field: &'static str, reason: String },
}

impl JudgeError {
    pub fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            field,
            reason: reason.into(),
        }
    }
}
