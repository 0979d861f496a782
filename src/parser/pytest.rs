//! Line-oriented marker dialect (pytest-style output)
//!
//! Two line shapes are recognized:
//! - status-first: `PASSED pkg/test_a.py::TestCase::test_m`
//! - status-last: `pkg/test_a.py::TestCase::test_m PASSED [ 47%]`
//!
//! Status-first `FAILED` lines may carry a ` - reason` suffix which is
//! stripped. Status-last lines must contain a `::`-qualified node id so
//! summary prose ("1 test FAILED") is not mistaken for a result.

use super::{OutcomeMap, TestOutcome};

fn outcome_for(word: &str) -> Option<TestOutcome> {
    match word {
        "PASSED" | "XFAIL" => Some(TestOutcome::Passed),
        "FAILED" | "XPASS" => Some(TestOutcome::Failed),
        "ERROR" => Some(TestOutcome::Error),
        "SKIPPED" => Some(TestOutcome::Skipped),
        _ => None,
    }
}

pub fn parse(raw: &str) -> OutcomeMap {
    let mut outcomes = OutcomeMap::new();

    for line in raw.lines() {
        let line = line.trim();
        let mut tokens = line.split_whitespace();
        let (Some(first), Some(second)) = (tokens.next(), tokens.next()) else {
            continue;
        };

        if let Some(outcome) = outcome_for(first) {
            // status-first: name is everything after the marker, with any
            // ` - reason` suffix stripped
            let rest = line[first.len()..].trim();
            let name = rest.split(" - ").next().unwrap_or("").trim();
            if !name.is_empty() {
                outcomes.insert(name.to_string(), outcome);
            }
            continue;
        }

        if let Some(outcome) = outcome_for(second) {
            if first.contains("::") {
                outcomes.insert(first.to_string(), outcome);
            }
        }
    }

    outcomes
}
