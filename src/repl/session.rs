//! REPL session boundary: the sandbox contract the orchestration loop depends on
//!
//! The sandbox itself lives behind this trait. The loop only ever sees
//! observations and a done flag, never the environment's internals, so test
//! doubles can script deterministic `(Observation, done)` sequences.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of one code submission inside the sandbox
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the code ran without raising
    pub success: bool,
    /// Captured standard output
    #[serde(default)]
    pub stdout: String,
    /// Captured standard error
    #[serde(default)]
    pub stderr: String,
}

/// Snapshot of session state after a reset or execute call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Result of the most recent execution (empty after reset)
    #[serde(default)]
    pub result: ExecutionResult,
    /// Current iteration counter (0 right after reset)
    pub iteration: usize,
    /// Configured iteration budget
    pub max_iterations: usize,
    /// Length of the loaded context in characters
    #[serde(default)]
    pub context_length: usize,
}

/// One execute call: the new observation plus the environment's done signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    /// True once the sandbox detected a final-answer signal or the
    /// post-execution iteration counter reached the budget
    pub done: bool,
}

/// Terminal snapshot, meaningful only after the session reports done
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    /// The final answer, absent when the run ended by exhausting the budget
    pub final_answer: Option<String>,
}

/// Error type for session operations
#[derive(Debug)]
pub enum SessionError {
    Request(reqwest::Error),
    Parse(serde_json::Error),
    Protocol(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Request(e) => write!(f, "Request error: {}", e),
            SessionError::Parse(e) => write!(f, "Parse error: {}", e),
            SessionError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<reqwest::Error> for SessionError {
    fn from(e: reqwest::Error) -> Self {
        SessionError::Request(e)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        SessionError::Parse(e)
    }
}

/// Stateful handle to a sandboxed REPL environment
///
/// Contract the loop relies on:
/// - `reset` yields the first observation with `iteration == 0`
/// - `execute` advances the iteration counter by exactly one
/// - `state` is queried only after `execute` reported done
/// - `close` is idempotent and called exactly once per run, on every exit path
#[async_trait]
pub trait ReplSession: Send {
    /// Initialize a fresh sandbox pre-loaded with the given context.
    ///
    /// The credential is passed through opaquely for any sub-LLM calls the
    /// sandbox makes on its own; the loop never inspects it.
    async fn reset(
        &mut self,
        context: &str,
        task_prompt: &str,
        max_iterations: usize,
        credential: Option<&str>,
    ) -> Result<Observation, SessionError>;

    /// Submit one code fragment for execution.
    async fn execute(&mut self, code: &str) -> Result<StepResult, SessionError>;

    /// Query the terminal state (final answer, if any).
    async fn state(&mut self) -> Result<RunState, SessionError>;

    /// Release all sandbox resources.
    async fn close(&mut self) -> Result<(), SessionError>;
}
