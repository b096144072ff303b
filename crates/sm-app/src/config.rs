//! Processor configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sm_fmu::{PendingPolicy, StatusGovernor};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Return one record per step; otherwise only the final outputs.
    pub results_per_step: bool,
    /// Also register create/step/destroy operations per model.
    pub explicit_lifecycle: bool,
    pub pending_poll_interval_ms: u64,
    pub pending_timeout_ms: u64,
    /// Stripped (case-insensitively) from model collection idShorts.
    pub model_prefix: String,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            results_per_step: true,
            explicit_lifecycle: false,
            pending_poll_interval_ms: 100,
            pending_timeout_ms: 10_000,
            model_prefix: "SimulationModel_".to_string(),
        }
    }
}

impl ProcessorConfig {
    pub fn governor(&self) -> StatusGovernor {
        StatusGovernor::new(PendingPolicy::from_millis(
            self.pending_poll_interval_ms,
            self.pending_timeout_ms,
        ))
    }

    /// Model name for a model collection idShort.
    pub fn model_name(&self, id_short: &str) -> String {
        let prefix_len = self.model_prefix.len();
        match id_short.get(..prefix_len) {
            Some(head) if !self.model_prefix.is_empty() && head.eq_ignore_ascii_case(&self.model_prefix) => {
                id_short[prefix_len..].to_string()
            }
            _ => id_short.to_string(),
        }
    }

    fn validate(self) -> AppResult<Self> {
        if self.pending_poll_interval_ms == 0 {
            return Err(AppError::Config(
                "pending_poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Load a configuration file; `.json` is read as JSON, anything else as YAML.
pub fn load_config(path: &Path) -> AppResult<ProcessorConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| AppError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ProcessorConfig = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };
    config.validate()
}
