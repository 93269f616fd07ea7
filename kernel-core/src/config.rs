//! Kernel configuration.
//!
//! Field set matches spec.md §6 exactly (persistence path, global KB
//! capacity, LLM endpoint/model/temperature/timeout, tool concurrency) plus
//! the control loop's polling interval and warmup delay from §4.7. Follows
//! `caliber-core::config`'s convention of a single required-fields struct
//! with an explicit `validate()`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Master configuration struct. All values are required; there is no
/// environment-variable fallback layer (unlike the teacher's
/// `ContextAssemblyDefaults::from_env`) since the kernel has no deployment
/// surface of its own — `kernel-control`'s binary owns loading this from a
/// file or environment before constructing the kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct KernelConfig {
    /// Path to the file the knowledge base snapshots itself to and restores
    /// from at startup.
    pub persistence_file_path: String,
    /// Soft cap on live assertions in the `global-kb` partition before the
    /// eviction policy (disabled by default, see SPEC_FULL.md §4.2) kicks in.
    pub global_kb_capacity: usize,
    pub llm_api_url: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_timeout_seconds: u64,
    /// Size of the shared worker pool primitive tools execute on.
    pub concurrency: usize,
    /// Interval between control-loop ticks once past warmup.
    #[cfg_attr(feature = "openapi", schema(value_type = u64))]
    pub polling_interval: Duration,
    /// Delay before the first tick, giving the KB time to finish restoring
    /// from `persistence_file_path`.
    #[cfg_attr(feature = "openapi", schema(value_type = u64))]
    pub warmup: Duration,
}

impl KernelConfig {
    /// Defaults matching spec.md §4.7 ("default 500ms after 100ms warmup")
    /// and otherwise reasonable standalone values; callers are expected to
    /// override `llm_api_url`/`llm_model` at minimum.
    pub fn development() -> Self {
        Self {
            persistence_file_path: "kernel.kb.json".to_string(),
            global_kb_capacity: 100_000,
            llm_api_url: "http://localhost:11434/v1/chat/completions".to_string(),
            llm_model: "local-model".to_string(),
            llm_temperature: 0.2,
            llm_timeout_seconds: 30,
            concurrency: 4,
            polling_interval: Duration::from_millis(500),
            warmup: Duration::from_millis(100),
        }
    }

    /// Validates required invariants: non-empty paths/URLs, a sane
    /// temperature range, and positive durations/capacities.
    pub fn validate(&self) -> Result<(), crate::error::ValidationError> {
        use crate::error::ValidationError;

        if self.persistence_file_path.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "persistence_file_path".to_string(),
            });
        }
        if self.llm_api_url.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "llm_api_url".to_string(),
            });
        }
        if self.llm_model.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "llm_model".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err(ValidationError::InvalidValue {
                field: "llm_temperature".to_string(),
                reason: "llm_temperature must be between 0.0 and 2.0".to_string(),
            });
        }
        if self.llm_timeout_seconds == 0 {
            return Err(ValidationError::InvalidValue {
                field: "llm_timeout_seconds".to_string(),
                reason: "llm_timeout_seconds must be positive".to_string(),
            });
        }
        if self.global_kb_capacity == 0 {
            return Err(ValidationError::InvalidValue {
                field: "global_kb_capacity".to_string(),
                reason: "global_kb_capacity must be positive".to_string(),
            });
        }
        if self.concurrency == 0 {
            return Err(ValidationError::InvalidValue {
                field: "concurrency".to_string(),
                reason: "concurrency must be positive".to_string(),
            });
        }
        if self.polling_interval.is_zero() {
            return Err(ValidationError::InvalidValue {
                field: "polling_interval".to_string(),
                reason: "polling_interval must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults_are_valid() {
        assert!(KernelConfig::development().validate().is_ok());
    }

    #[test]
    fn rejects_empty_llm_model() {
        let mut cfg = KernelConfig::development();
        cfg.llm_model = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let mut cfg = KernelConfig::development();
        cfg.llm_temperature = 3.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_concurrency() {
        let mut cfg = KernelConfig::development();
        cfg.concurrency = 0;
        assert!(cfg.validate().is_err());
    }
}
