//! Dataset record validation and normalization
//!
//! Turns a raw key-value document into a validated [`TaskRecord`]. The
//! interesting part is list-field normalization: test lists arrive as real
//! JSON arrays, as JSON-array strings, or as Python-literal strings with
//! single quotes, and all three must normalize to the same ordered
//! sequence. Normalizers are tried in that order; only each attempt's own
//! parse failure is swallowed, and total failure yields an empty sequence
//! (a missing test list is a legitimate task shape, not a fatal error).

use serde_json::Value;
use tracing::debug;

use super::types::{RawTaskRecord, TaskRecord};
use crate::error::JudgeError;
use crate::parser::Dialect;

/// Parse a whole task document into a validated record.
///
/// The input must be a single structured document with a top-level
/// object. Line-by-line parsing is never attempted: a pretty-printed
/// document read line-wise would misparse silently, so anything that is
/// not one JSON object is rejected outright.
pub fn load_task_record(input: &str) -> Result<TaskRecord, JudgeError> {
    let value: Value = serde_json::from_str(input)
        .map_err(|e| JudgeError::malformed("document", e.to_string()))?;
    task_record_from_value(value)
}

/// Validate an already-deserialized key-value document.
pub fn task_record_from_value(value: Value) -> Result<TaskRecord, JudgeError> {
    if !value.is_object() {
        return Err(JudgeError::malformed(
            "document",
            "expected a top-level object",
        ));
    }

    let raw: RawTaskRecord = serde_json::from_value(value)
        .map_err(|e| JudgeError::malformed("record", e.to_string()))?;

    if raw.instance_id.trim().is_empty() {
        return Err(JudgeError::malformed("instance_id", "missing or empty"));
    }
    if raw.test_command.trim().is_empty() {
        return Err(JudgeError::malformed("test_command", "missing or empty"));
    }

    let fix_tests = normalize_string_list(&raw.fail_to_pass);
    let regression_tests = normalize_string_list(&raw.pass_to_pass);
    let test_patches = normalize_patch_list(&raw.test_patches);

    debug!(
        instance_id = %raw.instance_id,
        fix_tests = fix_tests.len(),
        regression_tests = regression_tests.len(),
        test_patches = test_patches.len(),
        "loaded task record"
    );

    Ok(TaskRecord {
        instance_id: raw.instance_id,
        repo: raw.repo,
        base_commit: raw.base_commit,
        version: raw.version,
        language: raw.language,
        test_command: raw.test_command,
        dialect: Dialect::from_id(&raw.parser_id),
        fix_tests,
        regression_tests,
        test_patches,
        candidate_patch: raw.candidate_patch,
    })
}

/// Normalize a list-valued field to an ordered sequence of strings.
///
/// Tried in order: structured array, JSON-array string, single-quoted
/// literal string, empty.
fn normalize_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Value::String(s) => {
            if let Ok(items) = serde_json::from_str::<Vec<String>>(s) {
                return items;
            }
            parse_literal_list(s).unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

/// Normalize the test-patch field.
///
/// Accepts a list of patch blobs or a single patch string; a bare diff
/// string becomes a one-element sequence rather than being run through
/// the list normalizers (diff text is not a list literal).
fn normalize_patch_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(_) => normalize_string_list(value),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.starts_with('[') {
                if let Ok(items) = serde_json::from_str::<Vec<String>>(trimmed) {
                    return items;
                }
                if let Some(items) = parse_literal_list(trimmed) {
                    return items;
                }
            }
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![s.clone()]
            }
        }
        _ => Vec::new(),
    }
}

/// Permissive literal-sequence parser.
///
/// Handles `['a', "b"]`-style arrays: elements quoted with either quote
/// character, backslash escapes inside elements. Returns `None` on any
/// structural mismatch so the caller can fall through to the empty
/// default.
fn parse_literal_list(input: &str) -> Option<Vec<String>> {
    let inner = input.trim().strip_prefix('[')?.strip_suffix(']')?;
    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        let Some(&quote) = chars.peek() else { break };
        if quote != '\'' && quote != '"' {
            return None;
        }
        chars.next();

        let mut item = String::new();
        loop {
            match chars.next()? {
                '\\' => match chars.next()? {
                    'n' => item.push('\n'),
                    't' => item.push('\t'),
                    other => item.push(other),
                },
                c if c == quote => break,
                c => item.push(c),
            }
        }
        items.push(item);

        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            Some(',') => continue,
            None => break,
            Some(_) => return None,
        }
    }

    Some(items)
}
