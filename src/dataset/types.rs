//! Task record types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parser::Dialect;

/// Raw task record as it arrives from a dataset document.
///
/// List-valued fields are kept as generic JSON values: depending on the
/// export path, datasets encode them as real arrays, JSON-array strings,
/// or Python-literal strings with single quotes. The loader normalizes
/// all three.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTaskRecord {
    #[serde(default)]
    pub instance_id: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub base_commit: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub language: String,
    #[serde(default, alias = "test_cmd")]
    pub test_command: String,
    #[serde(default, alias = "log_parser")]
    pub parser_id: String,
    #[serde(default, rename = "FAIL_TO_PASS", alias = "fail_to_pass")]
    pub fail_to_pass: Value,
    #[serde(default, rename = "PASS_TO_PASS", alias = "pass_to_pass")]
    pub pass_to_pass: Value,
    #[serde(default, alias = "test_patch")]
    pub test_patches: Value,
    #[serde(default, alias = "patch", alias = "model_patch")]
    pub candidate_patch: String,
}

/// Validated unit of work for one evaluation attempt.
///
/// Read once per attempt; never mutated. Test names are compared
/// byte-exactly against parser output, so they are carried verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Unique task identifier
    pub instance_id: String,
    /// Source repository (audit metadata, may be empty)
    #[serde(default)]
    pub repo: String,
    /// Commit the environment was prepared at (audit metadata)
    #[serde(default)]
    pub base_commit: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub language: String,
    /// Command invoked verbatim inside the environment
    pub test_command: String,
    /// Output dialect of the test runner
    pub dialect: Dialect,
    /// FAIL_TO_PASS: tests expected to transition from failing to passing
    pub fix_tests: Vec<String>,
    /// PASS_TO_PASS: tests expected to keep passing
    pub regression_tests: Vec<String>,
    /// Reference test patches, applied strictly in order
    pub test_patches: Vec<String>,
    /// The candidate patch under evaluation
    pub candidate_patch: String,
}
