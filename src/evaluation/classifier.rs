//! Resolution classifier
//!
//! Cross-references parsed test outcomes against the task's two declared
//! test sets. Pure: no I/O, no environment access, byte-exact name
//! matching with no normalization.

use crate::dataset::TaskRecord;
use crate::parser::{OutcomeMap, TestOutcome};

/// Partitioned verdict over the task's fix and regression test sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub fix_tests_succeeded: Vec<String>,
    pub fix_tests_failed: Vec<String>,
    pub regression_tests_succeeded: Vec<String>,
    pub regression_tests_failed: Vec<String>,
    /// Every fix test and every regression test landed in its succeeded
    /// partition (vacuously true for empty lists)
    pub resolved: bool,
}

/// Classify parsed outcomes against the task's declared test sets.
///
/// A name goes to the succeeded partition iff its parsed outcome is
/// exactly `Passed`. A name absent from the parsed mapping is failed, not
/// an error: a test that never ran is not resolved.
pub fn classify(parsed: &OutcomeMap, task: &TaskRecord) -> Classification {
    let (fix_tests_succeeded, fix_tests_failed) = partition(&task.fix_tests, parsed);
    let (regression_tests_succeeded, regression_tests_failed) =
        partition(&task.regression_tests, parsed);

    let resolved = fix_tests_failed.is_empty() && regression_tests_failed.is_empty();

    Classification {
        fix_tests_succeeded,
        fix_tests_failed,
        regression_tests_succeeded,
        regression_tests_failed,
        resolved,
    }
}

fn partition(names: &[String], parsed: &OutcomeMap) -> (Vec<String>, Vec<String>) {
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();
    for name in names {
        match parsed.get(name) {
            Some(TestOutcome::Passed) => succeeded.push(name.clone()),
            _ => failed.push(name.clone()),
        }
    }
    (succeeded, failed)
}
