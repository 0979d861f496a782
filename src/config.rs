//! Evaluation configuration
//!
//! Defines the knobs for one evaluation engine instance:
//! - wall-clock limit for the test command
//! - candidate activation scripts sourced before tests
//! - where patches and scripts are staged inside the environment

use serde::{Deserialize, Serialize};

/// Configuration for the patch-evaluation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Hard wall-clock limit for the test command, in seconds
    pub test_timeout_secs: u64,
    /// Grace period added to the outer timeout so the in-container
    /// `timeout` wrapper gets a chance to fire first
    pub timeout_grace_secs: u64,
    /// Time limit for individual setup commands (patch apply, resets)
    pub setup_timeout_secs: u64,
    /// Candidate environment-activation scripts; the first one present is
    /// sourced best-effort before the test command runs
    pub activation_scripts: Vec<String>,
    /// Directory inside the environment where patches and the test script
    /// are staged
    pub staging_dir: String,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            test_timeout_secs: 600,
            timeout_grace_secs: 30,
            setup_timeout_secs: 120,
            activation_scripts: vec![
                "/opt/miniconda3/bin/activate".to_string(),
                "/root/.venv/bin/activate".to_string(),
                ".venv/bin/activate".to_string(),
            ],
            staging_dir: "/tmp".to_string(),
        }
    }
}

impl EvalConfig {
    /// Override the test-command timeout
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.test_timeout_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EvalConfig::default();
        assert_eq!(config.test_timeout_secs, 600);
        assert_eq!(config.staging_dir, "/tmp");
        assert!(!config.activation_scripts.is_empty());
    }

    #[test]
    fn test_with_timeout() {
        let config = EvalConfig::default().with_timeout(5);
        assert_eq!(config.test_timeout_secs, 5);
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = EvalConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EvalConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.test_timeout_secs, config.test_timeout_secs);
        assert_eq!(back.activation_scripts, config.activation_scripts);
    }
}
