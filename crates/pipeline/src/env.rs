//! Environment-based configuration overrides.
//!
//! `.env` is loaded opportunistically (dotenvy), then any recognized
//! `INTAKE_*` variable overrides the matching [`ImportConfig`] default.
//! Unparseable values fall back to the default with a warning rather
//! than aborting startup.

use intake_core::config::{ImportConfig, UpdatePolicy};

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring unparseable override");
            None
        }
    }
}

/// Build an [`ImportConfig`] from defaults plus environment overrides.
pub fn config_from_env() -> ImportConfig {
    dotenvy::dotenv().ok();

    let mut config = ImportConfig::default();
    if let Some(v) = parse_var("INTAKE_MAX_FILE_BYTES") {
        config.max_file_bytes = v;
    }
    if let Some(v) = parse_var("INTAKE_MAX_ROWS") {
        config.max_rows = v;
    }
    if let Some(v) = parse_var("INTAKE_CHUNK_SIZE") {
        config.chunk_size = v;
    }
    if let Some(v) = parse_var("INTAKE_CONCURRENCY_LIMIT") {
        // Reserved knob; see `ImportConfig::concurrency_limit`.
        config.concurrency_limit = v;
    }
    if let Ok(policy) = std::env::var("INTAKE_UPDATE_POLICY") {
        match policy.as_str() {
            "merge" => config.update_policy = UpdatePolicy::Merge,
            "fill_only" => config.update_policy = UpdatePolicy::FillOnly,
            other => {
                tracing::warn!(value = other, "unknown INTAKE_UPDATE_POLICY, keeping default");
            }
        }
    }
    config
}
