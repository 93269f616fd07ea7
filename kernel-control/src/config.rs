//! Environment-variable overlay for `kernel_core::KernelConfig`.
//!
//! `KernelConfig` itself (field set, `development()` defaults, `validate()`)
//! lives in `kernel-core` since every crate needs the shape; only the
//! binary knows how configuration is actually supplied, so the `from_env`
//! overlay lives here. Follows `caliber-api::config::ApiConfig::from_env`'s
//! convention: start from `Default`/`development()`, overlay each
//! `KERNEL_*` variable with `.ok().and_then(...).unwrap_or(default)`, no
//! `config`-crate dependency.

use kernel_core::{KernelConfig, KernelResult};
use std::time::Duration;

/// Builds a `KernelConfig` from `KernelConfig::development()` overlaid with
/// any `KERNEL_*` environment variables present, then validates it.
///
/// Recognized variables:
/// - `KERNEL_PERSISTENCE_FILE_PATH`
/// - `KERNEL_GLOBAL_KB_CAPACITY`
/// - `KERNEL_LLM_API_URL`
/// - `KERNEL_LLM_MODEL`
/// - `KERNEL_LLM_TEMPERATURE`
/// - `KERNEL_LLM_TIMEOUT_SECONDS`
/// - `KERNEL_CONCURRENCY`
/// - `KERNEL_POLLING_INTERVAL_MS`
/// - `KERNEL_WARMUP_MS`
pub fn load() -> KernelResult<KernelConfig> {
    let defaults = KernelConfig::development();

    let config = KernelConfig {
        persistence_file_path: env_string("KERNEL_PERSISTENCE_FILE_PATH", defaults.persistence_file_path),
        global_kb_capacity: env_parsed("KERNEL_GLOBAL_KB_CAPACITY", defaults.global_kb_capacity),
        llm_api_url: env_string("KERNEL_LLM_API_URL", defaults.llm_api_url),
        llm_model: env_string("KERNEL_LLM_MODEL", defaults.llm_model),
        llm_temperature: env_parsed("KERNEL_LLM_TEMPERATURE", defaults.llm_temperature),
        llm_timeout_seconds: env_parsed("KERNEL_LLM_TIMEOUT_SECONDS", defaults.llm_timeout_seconds),
        concurrency: env_parsed("KERNEL_CONCURRENCY", defaults.concurrency),
        polling_interval: env_duration_ms("KERNEL_POLLING_INTERVAL_MS", defaults.polling_interval),
        warmup: env_duration_ms("KERNEL_WARMUP_MS", defaults.warmup),
    };

    config.validate()?;
    Ok(config)
}

fn env_string(key: &str, default: String) -> String {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty()).unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_duration_ms(key: &str, default: Duration) -> Duration {
    std::env::var(key).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn falls_back_to_development_defaults_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("KERNEL_LLM_MODEL");
        let config = load().unwrap();
        assert_eq!(config.llm_model, KernelConfig::development().llm_model);
    }

    #[test]
    fn overlays_a_present_variable() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("KERNEL_LLM_MODEL", "gpt-test");
        let config = load().unwrap();
        std::env::remove_var("KERNEL_LLM_MODEL");
        assert_eq!(config.llm_model, "gpt-test");
    }

    #[test]
    fn rejects_an_invalid_overlay() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("KERNEL_LLM_TEMPERATURE", "9.9");
        let result = load();
        std::env::remove_var("KERNEL_LLM_TEMPERATURE");
        assert!(result.is_err());
    }
}
