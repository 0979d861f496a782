//! Patch-application pipeline
//!
//! Runs the four evaluation stages in strict order against a prepared
//! environment:
//!
//! 1. apply the candidate patch to the working tree
//! 2. reset the files touched by the reference test patches to their
//!    pristine state (the candidate must not tamper with the test suite)
//! 3. apply the reference test patches in their declared order,
//!    all-or-nothing
//! 4. source an activation script if present, then run the test command
//!    under a hard wall-clock timeout
//!
//! A failure at any stage short-circuits the rest and is reported as a
//! [`StageFailure`]; the pipeline itself never returns an error.

use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::EvalConfig;
use crate::container::ExecEnvironment;
use crate::dataset::TaskRecord;

/// Reason the pipeline stopped before producing test outcomes.
///
/// Mutually exclusive at the stage level: the first failure wins and the
/// remaining stages never run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageFailure {
    /// The candidate patch did not apply
    ApplyPatch(String),
    /// A reference test patch did not apply
    ApplyTestPatch(String),
    /// The test command exceeded the wall-clock limit
    Timeout,
    /// Environment or infrastructure failure before test output existed
    Infra(String),
}

/// What the pipeline produced for one task instance
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Combined test-runner output; empty when a stage failed before the
    /// test command ran
    pub raw_output: String,
    pub failure: Option<StageFailure>,
}

impl PipelineOutcome {
    fn failed(failure: StageFailure) -> Self {
        Self {
            raw_output: String::new(),
            failure: Some(failure),
        }
    }
}

/// Sequences the patch-application protocol against one environment
pub struct Pipeline {
    config: EvalConfig,
}

impl Pipeline {
    pub fn new(config: EvalConfig) -> Self {
        Self { config }
    }

    /// Run all stages for one task.
    ///
    /// Infrastructure errors are folded into `StageFailure::Infra`; every
    /// call yields exactly one outcome.
    pub async fn evaluate(&self, env: &dyn ExecEnvironment, task: &TaskRecord) -> PipelineOutcome {
        match self.run_stages(env, task).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    instance_id = %task.instance_id,
                    error = %e,
                    "evaluation infrastructure failure"
                );
                PipelineOutcome::failed(StageFailure::Infra(e.to_string()))
            }
        }
    }

    async fn run_stages(
        &self,
        env: &dyn ExecEnvironment,
        task: &TaskRecord,
    ) -> Result<PipelineOutcome> {
        let run_id = Uuid::new_v4().simple().to_string();
        let run_id = &run_id[..8];

        // Stage 1: candidate patch
        if !task.candidate_patch.trim().is_empty() {
            let patch_path = format!("{}/candidate-{}.patch", self.config.staging_dir, run_id);
            self.stage_file(env, &patch_path, &task.candidate_patch)
                .await?;

            let result = self
                .setup_cmd(
                    env,
                    &format!(
                        "git apply -v {p} || patch --batch --fuzz=5 -p1 -i {p}",
                        p = patch_path
                    ),
                )
                .await?;
            if !result.success() {
                debug!(instance_id = %task.instance_id, "candidate patch failed to apply");
                return Ok(PipelineOutcome::failed(StageFailure::ApplyPatch(
                    result.output,
                )));
            }
        }

        // Stage 2: reset test files the reference patches touch
        let test_files = patched_files(&task.test_patches);
        if !test_files.is_empty() {
            self.reset_files(env, &test_files).await?;
        }

        // Stage 3: reference test patches, in order, all-or-nothing
        for (index, patch) in task.test_patches.iter().enumerate() {
            let patch_path = format!(
                "{}/test-{}-{}.patch",
                self.config.staging_dir, index, run_id
            );
            self.stage_file(env, &patch_path, patch).await?;

            let result = self
                .setup_cmd(env, &format!("git apply -v {}", patch_path))
                .await?;
            if !result.success() {
                // roll back earlier entries so partial application is
                // never left behind
                if let Err(e) = self.reset_files(env, &test_files).await {
                    warn!(
                        instance_id = %task.instance_id,
                        error = %e,
                        "failed to roll back test files after test-patch failure"
                    );
                }
                debug!(
                    instance_id = %task.instance_id,
                    index,
                    "test patch failed to apply"
                );
                return Ok(PipelineOutcome::failed(StageFailure::ApplyTestPatch(
                    result.output,
                )));
            }
        }

        // Stage 4: run the test command under a hard timeout
        let script_path = format!("{}/run-tests-{}.sh", self.config.staging_dir, run_id);
        let script = self.build_test_script(env, task);
        self.stage_file(env, &script_path, &script).await?;

        let timeout_secs = self.config.test_timeout_secs;
        let outer_limit =
            Duration::from_secs(timeout_secs.saturating_add(self.config.timeout_grace_secs));
        let cmd = format!(
            "timeout -k 10 -s KILL {} /bin/sh {} 2>&1",
            timeout_secs, script_path
        );

        let result = env.run(&cmd, Some(outer_limit)).await?;

        if result.timed_out {
            // the in-container wrapper should have fired already; make
            // sure nothing is left running
            let _ = env
                .run(
                    &format!("pkill -KILL -f {} || true", script_path),
                    Some(Duration::from_secs(10)),
                )
                .await;
            warn!(instance_id = %task.instance_id, timeout_secs, "test command timed out");
            return Ok(PipelineOutcome {
                raw_output: result.output,
                failure: Some(StageFailure::Timeout),
            });
        }

        // 124 is coreutils timeout, 137 is SIGKILL after the -k grace
        if result.exit_code == 124 || result.exit_code == 137 {
            warn!(instance_id = %task.instance_id, timeout_secs, "test command killed by timeout wrapper");
            return Ok(PipelineOutcome {
                raw_output: result.output,
                failure: Some(StageFailure::Timeout),
            });
        }

        Ok(PipelineOutcome {
            raw_output: result.output,
            failure: None,
        })
    }

    /// Upload a file into the environment via a heredoc with a unique
    /// sentinel (patch blobs may contain anything except the sentinel).
    async fn stage_file(
        &self,
        env: &dyn ExecEnvironment,
        path: &str,
        content: &str,
    ) -> Result<()> {
        let sentinel = format!("PJ_EOF_{}", Uuid::new_v4().simple());
        let script = format!("cat > {path} << '{sentinel}'\n{content}\n{sentinel}");
        let result = env
            .run(
                &script,
                Some(Duration::from_secs(self.config.setup_timeout_secs)),
            )
            .await?;
        if !result.success() {
            return Err(anyhow!("failed to stage file {}: {}", path, result.output));
        }
        Ok(())
    }

    /// Run a setup command in the working tree.
    async fn setup_cmd(
        &self,
        env: &dyn ExecEnvironment,
        cmd: &str,
    ) -> Result<crate::container::ExecResult> {
        env.run(
            cmd,
            Some(Duration::from_secs(self.config.setup_timeout_secs)),
        )
        .await
    }

    /// Restore the given tracked files to their committed state. Paths a
    /// test patch creates from scratch are not in HEAD; those failures
    /// are tolerated.
    async fn reset_files(&self, env: &dyn ExecEnvironment, files: &[String]) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }
        let list = files
            .iter()
            .map(|f| shell_quote(f))
            .collect::<Vec<_>>()
            .join(" ");
        let cmd = format!(
            "for f in {list}; do git checkout -- \"$f\" 2>/dev/null || true; done"
        );
        let result = self.setup_cmd(env, &cmd).await?;
        if !result.success() {
            return Err(anyhow!("failed to reset test files: {}", result.output));
        }
        Ok(())
    }

    fn build_test_script(&self, env: &dyn ExecEnvironment, task: &TaskRecord) -> String {
        let mut script = String::from("#!/bin/sh\n");
        for candidate in &self.config.activation_scripts {
            script.push_str(&format!(
                "if [ -f {q} ]; then . {q} 2>/dev/null || true; fi\n",
                q = shell_quote(candidate)
            ));
        }
        script.push_str(&format!("cd {}\n", shell_quote(env.workdir())));
        script.push_str(&task.test_command);
        script.push('\n');
        script
    }
}

/// Extract the file paths a set of patches touches, in first-seen order.
pub fn patched_files(patches: &[String]) -> Vec<String> {
    let mut files: Vec<String> = Vec::new();
    for patch in patches {
        for line in patch.lines() {
            let path = if let Some(rest) = line.strip_prefix("diff --git a/") {
                rest.split(" b/").next()
            } else if let Some(rest) = line.strip_prefix("+++ b/") {
                Some(rest.trim())
            } else {
                None
            };
            if let Some(path) = path {
                let path = path.to_string();
                if !path.is_empty() && !files.contains(&path) {
                    files.push(path);
                }
            }
        }
    }
    files
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
