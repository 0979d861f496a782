//! Narrative dialect (unittest-style verbose output)
//!
//! One line per test: `test_m (pkg.Class) ... ok`. The reconstructed name
//! keeps the runner's own form, method plus parenthesized container:
//! `test_m (pkg.Class)`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{OutcomeMap, TestOutcome};

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>\S+ \([^()\s]+\))\s+\.\.\.\s+(?P<verdict>.+)$").expect("valid regex")
});

fn outcome_for(verdict: &str) -> Option<TestOutcome> {
    let verdict = verdict.trim();
    if verdict == "ok" || verdict.starts_with("expected failure") {
        Some(TestOutcome::Passed)
    } else if verdict.starts_with("FAIL") || verdict.starts_with("unexpected success") {
        Some(TestOutcome::Failed)
    } else if verdict.starts_with("ERROR") {
        Some(TestOutcome::Error)
    } else if verdict.starts_with("skipped") {
        Some(TestOutcome::Skipped)
    } else {
        None
    }
}

pub fn parse(raw: &str) -> OutcomeMap {
    let mut outcomes = OutcomeMap::new();

    for line in raw.lines() {
        let Some(caps) = LINE_RE.captures(line.trim_end()) else {
            continue;
        };
        if let Some(outcome) = outcome_for(&caps["verdict"]) {
            outcomes.insert(caps["name"].to_string(), outcome);
        }
    }

    outcomes
}
