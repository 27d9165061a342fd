//! Service configuration
//!
//! Everything environment-derived is read once at startup into an explicit
//! struct; nothing downstream touches process-wide state, so several
//! controllers with different settings can coexist in one process.

use std::path::PathBuf;

/// Error type for configuration loading
#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::Invalid(var, value) => {
                write!(f, "Invalid value for {}: '{}'", var, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Full service configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP API binds to
    pub listen_addr: String,
    /// Base URL of the OpenAI-compatible completion API
    pub llm_base_url: String,
    /// Bearer token for the completion API
    pub llm_api_key: String,
    /// Model identifier for the outer loop
    pub model_name: String,
    /// Base URL of the remote REPL environment service
    pub repl_env_url: String,
    /// Credential forwarded opaquely to the environment for sub-LLM calls
    pub hf_token: Option<String>,
    /// Iteration budget per run
    pub max_iterations: usize,
    /// Dataset identifier on the Hugging Face hub
    pub dataset: String,
    /// Dataset subset (config name)
    pub dataset_subset: String,
    /// Dataset split
    pub dataset_split: String,
    /// Requested indices wrap modulo this bound
    pub cutoff_index: usize,
    /// Directory for cached dataset examples
    pub data_dir: PathBuf,
    /// Directory for cached answers
    pub answer_dir: PathBuf,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// `OPENROUTER_API_KEY` and `SPACE_URL` are required; everything else
    /// has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let llm_api_key =
            std::env::var("OPENROUTER_API_KEY").map_err(|_| ConfigError::Missing("OPENROUTER_API_KEY"))?;
        let repl_env_url = std::env::var("SPACE_URL").map_err(|_| ConfigError::Missing("SPACE_URL"))?;

        let max_iterations = parse_var("MAX_ITERATIONS", 10)?;
        let cutoff_index = parse_var("CUTOFF_INDEX", 30)?;
        if cutoff_index == 0 {
            return Err(ConfigError::Invalid("CUTOFF_INDEX", "0".to_string()));
        }

        Ok(Self {
            listen_addr: var_or("RLM_LISTEN_ADDR", "0.0.0.0:8000"),
            llm_base_url: var_or("LLM_BASE_URL", "https://openrouter.ai/api/v1"),
            llm_api_key,
            model_name: var_or("MODEL_NAME", "openai/gpt-4.1-nano"),
            repl_env_url,
            hf_token: std::env::var("HF_TOKEN").ok(),
            max_iterations,
            dataset: var_or("DATASET_NAME", "oolongbench/oolong-real"),
            dataset_subset: var_or("DATASET_SUBSET", "default"),
            dataset_split: var_or("DATASET_SPLIT", "test"),
            cutoff_index,
            data_dir: PathBuf::from(var_or("RLM_DATA_DIR", "data")),
            answer_dir: PathBuf::from(var_or("RLM_ANSWER_DIR", "answers")),
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<usize>()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Missing("OPENROUTER_API_KEY");
        assert!(err.to_string().contains("OPENROUTER_API_KEY"));

        let err = ConfigError::Invalid("MAX_ITERATIONS", "ten".to_string());
        assert!(err.to_string().contains("'ten'"));
    }
}
