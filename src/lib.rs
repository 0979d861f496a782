//! Patch evaluation engine
//!
//! Given a candidate source-code patch, a dataset record describing a
//! bug-fix task, and a prepared execution environment containing the
//! target repository, this crate decides whether the patch actually fixes
//! the bug without breaking unrelated behavior.
//!
//! ## Module Structure
//!
//! - `dataset/`: task records and tolerant record loading
//! - `parser/`: per-dialect test-runner output parsers
//! - `container`: execution-environment handle (Docker via bollard)
//! - `evaluation/`: patch-application pipeline, classifier, reports
//! - `config`: engine configuration
//! - `error`: error taxonomy
//!
//! ## Flow
//!
//! Loader → Pipeline → Parser → Classifier → Report. One evaluation is
//! strictly sequential; run many instances concurrently by giving each
//! its own environment.

/// Engine configuration
pub mod config;

/// Execution environments (Docker containers)
pub mod container;

/// Task records and dataset loading
pub mod dataset;

/// Error types
pub mod error;

/// Evaluation pipeline, classification, and reporting
pub mod evaluation;

/// Test-runner output parsers
pub mod parser;

pub use config::EvalConfig;
pub use container::{ContainerEnv, ExecEnvironment, ExecResult};
pub use dataset::{load_task_record, task_record_from_value, TaskRecord};
pub use error::JudgeError;
pub use evaluation::{
    classify, Classification, EvaluationResult, Evaluator, InstanceReport, Pipeline,
    PipelineOutcome, ReportStore, StageFailure,
};
pub use parser::{Dialect, OutcomeMap, TestOutcome};
