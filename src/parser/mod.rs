//! Test-runner output parsers
//!
//! Each supported runner prints results in its own textual convention (a
//! "dialect"). Every dialect parser is a pure function from captured log
//! text to an ordered mapping of fully-qualified test name to outcome.
//! Lines that do not match the dialect's convention (progress bars,
//! warnings, build noise) are ignored, never treated as errors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub mod minitest;
pub mod phpunit;
pub mod pytest;
pub mod unittest;

/// Outcome of a single test as reported by the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    Passed,
    Failed,
    Error,
    Skipped,
}

/// Ordered mapping from fully-qualified test name to outcome.
///
/// Insertion order follows the log; re-reported names keep their first
/// position but take the latest outcome.
pub type OutcomeMap = IndexMap<String, TestOutcome>;

/// Supported test-runner output dialects.
///
/// A closed enum rather than a registry: adding a dialect means adding a
/// variant, and dispatch is exhaustively checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Line-oriented marker output (`PASSED pkg/test_a.py::T::m1`)
    Pytest,
    /// Narrative verbose output (`test_m (pkg.Class) ... ok`)
    Unittest,
    /// Testdox output (class header plus `[x] description` lines)
    PhpunitTestdox,
    /// Timing-annotated output (`Foo::Bar#test_x = 0.01 s = .`)
    Minitest,
}

impl Dialect {
    /// Resolve a dataset-declared parser id.
    ///
    /// Unknown ids degrade to the pytest dialect with a warning rather
    /// than failing the evaluation.
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "" | "pytest" | "pytest_v2" => Self::Pytest,
            "unittest" | "django" => Self::Unittest,
            "phpunit" | "phpunit_testdox" | "php" => Self::PhpunitTestdox,
            "minitest" | "ruby" | "rails" => Self::Minitest,
            other => {
                warn!(parser_id = %other, "unknown parser id, falling back to pytest dialect");
                Self::Pytest
            }
        }
    }

    /// Canonical id for this dialect
    pub fn id(&self) -> &'static str {
        match self {
            Self::Pytest => "pytest",
            Self::Unittest => "unittest",
            Self::PhpunitTestdox => "phpunit_testdox",
            Self::Minitest => "minitest",
        }
    }

    /// Parse captured runner output into an outcome mapping.
    ///
    /// Pure and deterministic: the same text always yields the same
    /// mapping, and parsing the concatenation of two logs yields the
    /// union of their mappings.
    pub fn parse(&self, raw: &str) -> OutcomeMap {
        match self {
            Self::Pytest => pytest::parse(raw),
            Self::Unittest => unittest::parse(raw),
            Self::PhpunitTestdox => phpunit::parse(raw),
            Self::Minitest => minitest::parse(raw),
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::Pytest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_known_ids() {
        assert_eq!(Dialect::from_id("pytest"), Dialect::Pytest);
        assert_eq!(Dialect::from_id("unittest"), Dialect::Unittest);
        assert_eq!(Dialect::from_id("django"), Dialect::Unittest);
        assert_eq!(Dialect::from_id("phpunit"), Dialect::PhpunitTestdox);
        assert_eq!(Dialect::from_id("minitest"), Dialect::Minitest);
        assert_eq!(Dialect::from_id("rails"), Dialect::Minitest);
    }

    #[test]
    fn test_dialect_from_id_case_insensitive() {
        assert_eq!(Dialect::from_id("PyTest"), Dialect::Pytest);
        assert_eq!(Dialect::from_id(" MINITEST "), Dialect::Minitest);
    }

    #[test]
    fn test_unknown_dialect_falls_back_to_pytest() {
        assert_eq!(Dialect::from_id("jest"), Dialect::Pytest);
        assert_eq!(Dialect::from_id(""), Dialect::Pytest);
    }

    #[test]
    fn test_dialect_id_round_trip() {
        for d in [
            Dialect::Pytest,
            Dialect::Unittest,
            Dialect::PhpunitTestdox,
            Dialect::Minitest,
        ] {
            assert_eq!(Dialect::from_id(d.id()), d);
        }
    }

    #[test]
    fn test_dialect_serde_snake_case() {
        let json = serde_json::to_string(&Dialect::PhpunitTestdox).unwrap();
        assert_eq!(json, r#""phpunit_testdox""#);
        let back: Dialect = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Dialect::PhpunitTestdox);
    }

    #[test]
    fn test_outcome_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&TestOutcome::Passed).unwrap(),
            r#""passed""#
        );
        assert_eq!(
            serde_json::to_string(&TestOutcome::Error).unwrap(),
            r#""error""#
        );
    }
}
