//! Runtime configuration.
//!
//! Precedence for every knob is CLI flag, then environment variable, then the
//! built-in default. The CLI layer passes flags in; this module owns the env
//! lookup and defaults.

use std::path::PathBuf;
use std::time::Duration;

pub const RUNS_DIR_ENV: &str = "DRAFTSMITH_RUNS_DIR";
pub const MODEL_ENV: &str = "DRAFTSMITH_MODEL";
pub const TIMEOUT_ENV: &str = "DRAFTSMITH_TIMEOUT_SECS";

pub const DEFAULT_RUNS_DIR: &str = "runs";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct Config {
    pub runs_dir: PathBuf,
    pub model: String,
    pub request_timeout: Duration,
}

impl Config {
    pub fn load(runs_dir_flag: Option<PathBuf>, model_flag: Option<String>) -> Self {
        let runs_dir = runs_dir_flag
            .or_else(|| std::env::var(RUNS_DIR_ENV).ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RUNS_DIR));
        let model = model_flag
            .or_else(|| std::env::var(MODEL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let request_timeout = std::env::var(TIMEOUT_ENV)
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Self {
            runs_dir,
            model,
            request_timeout,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runs_dir: PathBuf::from(DEFAULT_RUNS_DIR),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}
