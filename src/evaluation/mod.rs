//! Evaluation pipeline
//!
//! One evaluation is a strictly sequential pass over a single prepared
//! environment: patch-application protocol, output parsing,
//! classification, report assembly. Concurrency across task instances is
//! the caller's concern; the environment is the unit of isolation.

pub mod classifier;
pub mod pipeline;
pub mod report;

pub use classifier::{classify, Classification};
pub use pipeline::{patched_files, Pipeline, PipelineOutcome, StageFailure};
pub use report::{EvaluationResult, InstanceReport, ReportStore};

use std::time::Instant;

use anyhow::Result;
use tracing::info;

use crate::config::EvalConfig;
use crate::container::ExecEnvironment;
use crate::dataset::TaskRecord;

/// Drives one full evaluation: patch protocol, output parsing,
/// classification, and report assembly.
pub struct Evaluator {
    config: EvalConfig,
}

impl Evaluator {
    pub fn new(config: EvalConfig) -> Self {
        Self { config }
    }

    /// Evaluate a candidate patch in the given environment.
    ///
    /// Always yields exactly one complete result for a well-formed task:
    /// stage failures come back as flags, never as errors.
    pub async fn evaluate(
        &self,
        env: &dyn ExecEnvironment,
        task: &TaskRecord,
    ) -> EvaluationResult {
        let started = Instant::now();
        let pipeline = Pipeline::new(self.config.clone());
        let outcome = pipeline.evaluate(env, task).await;

        // on any stage failure the partitions stay empty and counts stay
        // zero; output that never came from a completed run is not parsed
        let (parsed, classification) = if outcome.failure.is_none() {
            let parsed = task.dialect.parse(&outcome.raw_output);
            let classification = classify(&parsed, task);
            (Some(parsed), Some(classification))
        } else {
            (None, None)
        };

        let result = EvaluationResult::assemble(
            task,
            &outcome,
            parsed.as_ref(),
            classification.as_ref(),
            started.elapsed().as_millis() as u64,
        );

        info!(
            "Evaluated {}: resolved={} passed={} failed={} errored={} ({}ms)",
            result.instance_id,
            result.resolved,
            result.tests_passed,
            result.tests_failed,
            result.tests_errored,
            result.duration_ms
        );

        result
    }

    /// Evaluate and persist the result and its audit artifacts.
    pub async fn evaluate_and_store(
        &self,
        env: &dyn ExecEnvironment,
        task: &TaskRecord,
        store: &ReportStore,
    ) -> Result<EvaluationResult> {
        let result = self.evaluate(env, task).await;
        store.persist(task, &result).await?;
        Ok(result)
    }
}
