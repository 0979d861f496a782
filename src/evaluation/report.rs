//! Report assembly and artifact persistence
//!
//! Combines stage-failure flags, classification partitions, counts, and
//! the raw test log into the final [`EvaluationResult`]. Assembly never
//! fails partially: when upstream stages failed, the result still comes
//! out complete, with the flags set and the partitions empty, so every
//! consumer always receives a well-formed record.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::classifier::Classification;
use super::pipeline::{PipelineOutcome, StageFailure};
use crate::dataset::TaskRecord;
use crate::parser::{OutcomeMap, TestOutcome};

/// Final structured verdict for one task instance.
///
/// Constructed once and written to durable storage; re-evaluation
/// produces a new result, never an update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub instance_id: String,
    pub resolved: bool,
    #[serde(default)]
    pub failed_apply_patch: bool,
    #[serde(default)]
    pub failed_apply_test_patch: bool,
    #[serde(default)]
    pub error_eval: bool,
    #[serde(default)]
    pub test_timeout: bool,
    pub tests_passed: usize,
    pub tests_failed: usize,
    pub tests_errored: usize,
    pub fix_tests_succeeded: Vec<String>,
    pub fix_tests_failed: Vec<String>,
    pub regression_tests_succeeded: Vec<String>,
    pub regression_tests_failed: Vec<String>,
    /// Raw combined test-runner output
    #[serde(default)]
    pub test_output: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl EvaluationResult {
    /// Assemble the final record from the pipeline outcome and, when the
    /// pipeline ran to completion, the parsed outcomes and classification.
    pub fn assemble(
        task: &TaskRecord,
        outcome: &PipelineOutcome,
        parsed: Option<&OutcomeMap>,
        classification: Option<&Classification>,
        duration_ms: u64,
    ) -> Self {
        let mut result = Self {
            instance_id: task.instance_id.clone(),
            resolved: false,
            failed_apply_patch: false,
            failed_apply_test_patch: false,
            error_eval: false,
            test_timeout: false,
            tests_passed: 0,
            tests_failed: 0,
            tests_errored: 0,
            fix_tests_succeeded: Vec::new(),
            fix_tests_failed: Vec::new(),
            regression_tests_succeeded: Vec::new(),
            regression_tests_failed: Vec::new(),
            test_output: outcome.raw_output.clone(),
            error_message: None,
            duration_ms,
            completed_at: Utc::now(),
        };

        match &outcome.failure {
            Some(StageFailure::ApplyPatch(log)) => {
                result.failed_apply_patch = true;
                result.error_message = Some(log.clone());
            }
            Some(StageFailure::ApplyTestPatch(log)) => {
                result.failed_apply_test_patch = true;
                result.error_message = Some(log.clone());
            }
            Some(StageFailure::Timeout) => {
                result.test_timeout = true;
                result.error_message = Some("test command exceeded wall-clock limit".to_string());
            }
            Some(StageFailure::Infra(message)) => {
                result.error_eval = true;
                result.error_message = Some(message.clone());
            }
            None => {}
        }

        if let Some(parsed) = parsed {
            for outcome in parsed.values() {
                match outcome {
                    TestOutcome::Passed => result.tests_passed += 1,
                    TestOutcome::Failed => result.tests_failed += 1,
                    TestOutcome::Error => result.tests_errored += 1,
                    TestOutcome::Skipped => {}
                }
            }
        }

        if let Some(classification) = classification {
            result.resolved = outcome.failure.is_none() && classification.resolved;
            result.fix_tests_succeeded = classification.fix_tests_succeeded.clone();
            result.fix_tests_failed = classification.fix_tests_failed.clone();
            result.regression_tests_succeeded = classification.regression_tests_succeeded.clone();
            result.regression_tests_failed = classification.regression_tests_failed.clone();
        }

        result
    }
}

/// Compact per-instance record for a generic reporting consumer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceReport {
    pub instance_id: String,
    /// A non-empty candidate patch was supplied
    pub patch_exists: bool,
    /// The candidate patch applied cleanly to the working tree
    pub patch_successfully_applied: bool,
    pub resolved: bool,
    pub fix_tests_succeeded: Vec<String>,
    pub fix_tests_failed: Vec<String>,
    pub regression_tests_succeeded: Vec<String>,
    pub regression_tests_failed: Vec<String>,
}

impl InstanceReport {
    pub fn new(task: &TaskRecord, result: &EvaluationResult) -> Self {
        let patch_exists = !task.candidate_patch.trim().is_empty();
        Self {
            instance_id: result.instance_id.clone(),
            patch_exists,
            patch_successfully_applied: patch_exists && !result.failed_apply_patch,
            resolved: result.resolved,
            fix_tests_succeeded: result.fix_tests_succeeded.clone(),
            fix_tests_failed: result.fix_tests_failed.clone(),
            regression_tests_succeeded: result.regression_tests_succeeded.clone(),
            regression_tests_failed: result.regression_tests_failed.clone(),
        }
    }
}

/// Durable storage for evaluation results and their audit artifacts.
///
/// Everything is keyed by `instance_id`: the structured result, the raw
/// candidate patch, the raw test log, and the compact report each land in
/// their own file under the instance directory.
pub struct ReportStore {
    root: PathBuf,
}

impl ReportStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist one evaluation. Re-running an instance overwrites its
    /// artifacts with the new result.
    pub async fn persist(
        &self,
        task: &TaskRecord,
        result: &EvaluationResult,
    ) -> Result<PathBuf> {
        let dir = self.root.join(&result.instance_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create report directory '{}'", dir.display()))?;

        let result_json = serde_json::to_string_pretty(result)
            .context("failed to serialize evaluation result")?;
        tokio::fs::write(dir.join("result.json"), result_json)
            .await
            .with_context(|| format!("failed to write result.json for '{}'", result.instance_id))?;

        tokio::fs::write(dir.join("patch.diff"), &task.candidate_patch)
            .await
            .with_context(|| format!("failed to write patch.diff for '{}'", result.instance_id))?;

        tokio::fs::write(dir.join("test_output.txt"), &result.test_output)
            .await
            .with_context(|| {
                format!("failed to write test_output.txt for '{}'", result.instance_id)
            })?;

        let report = InstanceReport::new(task, result);
        let report_json =
            serde_json::to_string_pretty(&report).context("failed to serialize instance report")?;
        tokio::fs::write(dir.join("report.json"), report_json)
            .await
            .with_context(|| format!("failed to write report.json for '{}'", result.instance_id))?;

        debug!(instance_id = %result.instance_id, dir = %dir.display(), "persisted evaluation artifacts");
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Dialect;

    fn task() -> TaskRecord {
        TaskRecord {
            instance_id: "proj__proj-7".into(),
            repo: String::new(),
            base_commit: String::new(),
            version: String::new(),
            language: String::new(),
            test_command: "pytest".into(),
            dialect: Dialect::Pytest,
            fix_tests: vec!["a".into()],
            regression_tests: vec!["b".into()],
            test_patches: vec![],
            candidate_patch: "diff --git a/x b/x\n".into(),
        }
    }

    fn success_outcome(raw: &str) -> PipelineOutcome {
        PipelineOutcome {
            raw_output: raw.into(),
            failure: None,
        }
    }

    #[test]
    fn test_assemble_success() {
        let t = task();
        let parsed: OutcomeMap = [
            ("a".to_string(), TestOutcome::Passed),
            ("b".to_string(), TestOutcome::Passed),
            ("c".to_string(), TestOutcome::Failed),
        ]
        .into_iter()
        .collect();
        let classification = crate::evaluation::classify(&parsed, &t);
        let result = EvaluationResult::assemble(
            &t,
            &success_outcome("log"),
            Some(&parsed),
            Some(&classification),
            42,
        );

        assert!(result.resolved);
        assert_eq!(result.tests_passed, 2);
        assert_eq!(result.tests_failed, 1);
        assert_eq!(result.tests_errored, 0);
        assert_eq!(result.fix_tests_succeeded, vec!["a"]);
        assert_eq!(result.regression_tests_succeeded, vec!["b"]);
        assert_eq!(result.test_output, "log");
        assert_eq!(result.duration_ms, 42);
        assert!(result.error_message.is_none());
    }

    #[test]
    fn test_assemble_apply_failure_is_complete() {
        let t = task();
        let outcome = PipelineOutcome {
            raw_output: String::new(),
            failure: Some(StageFailure::ApplyPatch("rejected hunk".into())),
        };
        let result = EvaluationResult::assemble(&t, &outcome, None, None, 5);

        assert!(!result.resolved);
        assert!(result.failed_apply_patch);
        assert!(!result.failed_apply_test_patch);
        assert!(!result.error_eval);
        assert!(!result.test_timeout);
        // zero counts are recorded explicitly, not omitted
        assert_eq!(result.tests_passed, 0);
        assert_eq!(result.tests_failed, 0);
        assert_eq!(result.tests_errored, 0);
        assert!(result.fix_tests_succeeded.is_empty());
        assert!(result.fix_tests_failed.is_empty());
        assert_eq!(result.error_message.as_deref(), Some("rejected hunk"));
    }

    #[test]
    fn test_assemble_timeout() {
        let t = task();
        let outcome = PipelineOutcome {
            raw_output: "partial".into(),
            failure: Some(StageFailure::Timeout),
        };
        let result = EvaluationResult::assemble(&t, &outcome, None, None, 5);
        assert!(result.test_timeout);
        assert!(!result.resolved);
        assert_eq!(result.test_output, "partial");
    }

    #[test]
    fn test_zero_count_fields_serialized() {
        let t = task();
        let outcome = PipelineOutcome {
            raw_output: String::new(),
            failure: Some(StageFailure::Infra("boom".into())),
        };
        let result = EvaluationResult::assemble(&t, &outcome, None, None, 5);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains(r#""tests_passed":0"#));
        assert!(json.contains(r#""tests_failed":0"#));
        assert!(json.contains(r#""tests_errored":0"#));
    }

    #[test]
    fn test_instance_report_flags() {
        let t = task();
        let result = EvaluationResult::assemble(&t, &success_outcome(""), None, None, 1);
        let report = InstanceReport::new(&t, &result);
        assert!(report.patch_exists);
        assert!(report.patch_successfully_applied);

        let mut empty_patch_task = t.clone();
        empty_patch_task.candidate_patch = String::new();
        let report = InstanceReport::new(&empty_patch_task, &result);
        assert!(!report.patch_exists);
        assert!(!report.patch_successfully_applied);
    }

    #[tokio::test]
    async fn test_store_persists_all_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ReportStore::new(tmp.path());
        let t = task();
        let parsed: OutcomeMap = [("a".to_string(), TestOutcome::Passed)].into_iter().collect();
        let classification = crate::evaluation::classify(&parsed, &t);
        let result = EvaluationResult::assemble(
            &t,
            &success_outcome("raw log"),
            Some(&parsed),
            Some(&classification),
            1,
        );

        let dir = store.persist(&t, &result).await.unwrap();
        assert_eq!(dir, tmp.path().join("proj__proj-7"));
        for artifact in ["result.json", "patch.diff", "test_output.txt", "report.json"] {
            assert!(dir.join(artifact).exists(), "missing {artifact}");
        }

        let loaded: EvaluationResult = serde_json::from_str(
            &std::fs::read_to_string(dir.join("result.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(loaded.instance_id, "proj__proj-7");
        assert_eq!(loaded.test_output, "raw log");
    }

    #[tokio::test]
    async fn test_store_overwrites_on_reevaluation() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ReportStore::new(tmp.path());
        let t = task();

        let first = EvaluationResult::assemble(&t, &success_outcome("first"), None, None, 1);
        store.persist(&t, &first).await.unwrap();
        let second = EvaluationResult::assemble(&t, &success_outcome("second"), None, None, 1);
        let dir = store.persist(&t, &second).await.unwrap();

        let log = std::fs::read_to_string(dir.join("test_output.txt")).unwrap();
        assert_eq!(log, "second");
    }
}
