//! RLM Controller - main orchestration loop for LLM-driven REPL execution
//!
//! The controller binds two independently evolving collaborators - a chat
//! model and a stateful REPL sandbox - under a bounded-iteration contract.
//! Each iteration it asks the model for a response, extracts fenced code,
//! executes it, and feeds the formatted observation back, until the sandbox
//! signals completion or the budget runs out.

use std::time::Instant;

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::llm::{ChatError, ModelClient};
use crate::metrics::{CODE_EXECUTIONS, LLM_CALL_TIME, RUN_ITERATIONS, RUN_TASKS};
use crate::repl::prompts::{build_system_prompt, build_user_prompt, QueryMetadata, NO_CODE_PROMPT, REPL_SYSTEM_PROMPT};
use crate::repl::session::{Observation, ReplSession, SessionError};
use crate::repl::{extract_code_blocks, format_observation};

use super::transcript::{Transcript, TranscriptEntry};

/// Configuration for one run of the loop
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Maximum number of model calls before forced termination
    pub max_iterations: usize,
    /// Custom system prompt (uses [`REPL_SYSTEM_PROMPT`] if None)
    pub system_prompt: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            system_prompt: None,
        }
    }
}

/// Result of one complete run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The final answer, absent when the budget ran out first
    pub final_answer: Option<String>,
    /// Full-fidelity audit transcript of the run
    pub transcript: Vec<TranscriptEntry>,
    /// Number of model calls made
    pub iterations: usize,
    /// Number of code fragments submitted to the sandbox
    pub executions: usize,
    /// Unique trace ID for this run
    pub trace_id: String,
}

/// Error type for the orchestration loop
///
/// Only collaborator failures land here. A response without code and an
/// exhausted budget are normal outcomes, and code that fails inside the
/// sandbox is surfaced to the model as an observation instead.
#[derive(Debug)]
pub enum RlmError {
    /// Model-call collaborator failed
    Chat(ChatError),
    /// REPL session operation failed
    Session(SessionError),
}

impl std::fmt::Display for RlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RlmError::Chat(e) => write!(f, "Model call failed: {}", e),
            RlmError::Session(e) => write!(f, "REPL session failed: {}", e),
        }
    }
}

impl std::error::Error for RlmError {}

impl From<ChatError> for RlmError {
    fn from(e: ChatError) -> Self {
        RlmError::Chat(e)
    }
}

impl From<SessionError> for RlmError {
    fn from(e: SessionError) -> Self {
        RlmError::Session(e)
    }
}

/// Orchestrates the iterate-until-done protocol between model and sandbox
pub struct RlmController<M: ModelClient> {
    model: M,
    config: RunConfig,
}

impl<M: ModelClient> RlmController<M> {
    /// Create a new controller
    pub fn new(model: M, config: RunConfig) -> Self {
        Self { model, config }
    }

    /// Run the loop for one context/task pair.
    ///
    /// Owns the session for the run's lifetime: it is closed on every exit
    /// path, including collaborator failures, before the error propagates.
    /// The credential is passed through to the sandbox at reset time.
    pub async fn run<S: ReplSession>(
        &self,
        mut session: S,
        context: &str,
        task_prompt: &str,
        credential: Option<&str>,
    ) -> Result<RunOutcome, RlmError> {
        let trace_id = Uuid::now_v7().to_string();

        let root_span = info_span!(
            "rlm_run",
            trace_id = %trace_id,
            max_iterations = self.config.max_iterations,
            otel.name = "rlm_run"
        );

        let outcome = self
            .drive(&mut session, context, task_prompt, credential, &trace_id)
            .instrument(root_span)
            .await;

        // The session is released exactly once per run, whatever happened
        // above.
        if let Err(e) = session.close().await {
            warn!(trace_id = %trace_id, error = %e, "Failed to close REPL session");
        }

        match &outcome {
            Ok(result) => {
                let label = if result.final_answer.is_some() {
                    "answered"
                } else {
                    "budget_exhausted"
                };
                RUN_TASKS.with_label_values(&[label]).inc();
                RUN_ITERATIONS.observe(result.iterations as f64);
            }
            Err(e) => {
                warn!(trace_id = %trace_id, error = %e, "Run failed");
                RUN_TASKS.with_label_values(&["error"]).inc();
            }
        }

        outcome
    }

    async fn drive<S: ReplSession>(
        &self,
        session: &mut S,
        context: &str,
        task_prompt: &str,
        credential: Option<&str>,
        trace_id: &str,
    ) -> Result<RunOutcome, RlmError> {
        info!(trace_id = %trace_id, context_len = context.len(), "Starting run");

        let first_obs = session
            .reset(context, task_prompt, self.config.max_iterations, credential)
            .await?;

        // Derived once from the first observation, immutable afterwards
        let metadata = QueryMetadata::single(first_obs.context_length);

        let system = self
            .config
            .system_prompt
            .as_deref()
            .unwrap_or(REPL_SYSTEM_PROMPT);

        let mut transcript = Transcript::new();
        for message in build_system_prompt(system, &metadata) {
            transcript.push_message(message);
        }
        transcript.push_message(build_user_prompt(task_prompt, 0));

        let mut final_answer: Option<String> = None;
        let mut iterations = 0usize;
        let mut executions = 0usize;

        'outer: for i in 1..=self.config.max_iterations {
            iterations = i;

            let llm_span = info_span!(
                "llm_call",
                trace_id = %trace_id,
                iteration = i,
                otel.name = "llm_call"
            );

            let call_start = Instant::now();
            let turn = self
                .model
                .chat(transcript.model_history())
                .instrument(llm_span)
                .await?;
            LLM_CALL_TIME.observe(call_start.elapsed().as_secs_f64());

            debug!(
                trace_id = %trace_id,
                iteration = i,
                response_len = turn.content.len(),
                completion_tokens = turn.usage.completion_tokens,
                "Model call completed"
            );

            let code_blocks = extract_code_blocks(&turn.content);

            if code_blocks.is_empty() {
                // The loop's only self-correction path: reprompt without
                // touching the session. Consumes an iteration slot.
                info!(trace_id = %trace_id, iteration = i, "No code in response, reprompting");
                transcript.push_assistant(&turn.content, Some(turn.usage), None);
                transcript.push_user(NO_CODE_PROMPT, None);
                continue;
            }

            let mut last_observation: Option<Observation> = None;
            let mut done = false;

            for code in &code_blocks {
                let exec_span = info_span!(
                    "code_execution",
                    trace_id = %trace_id,
                    iteration = i,
                    code_len = code.len(),
                    otel.name = "code_execution"
                );

                let step = session.execute(code).instrument(exec_span).await?;
                executions += 1;

                let status = if step.observation.result.success {
                    "success"
                } else {
                    "error"
                };
                CODE_EXECUTIONS.with_label_values(&[status]).inc();
                debug!(
                    trace_id = %trace_id,
                    env_iteration = step.observation.iteration,
                    status,
                    done = step.done,
                    "Code executed"
                );

                done = step.done;
                last_observation = Some(step.observation);

                if done {
                    // First fragment that completes the task wins; trailing
                    // fragments in this batch are never executed.
                    break;
                }
            }

            if done {
                let state = session.state().await?;
                final_answer = state.final_answer;
                info!(
                    trace_id = %trace_id,
                    iteration = i,
                    answered = final_answer.is_some(),
                    "Environment signaled done"
                );
                break 'outer;
            }

            // code_blocks is non-empty here, so at least one execution ran
            let Some(observation) = last_observation else {
                continue;
            };

            let observation_text = format_observation(&observation);
            let next_prompt = build_user_prompt(task_prompt, i);
            let user_content = format!("{}\n\n{}", observation_text, next_prompt.content);

            transcript.push_assistant(&turn.content, Some(turn.usage), Some(code_blocks));
            transcript.push_user(&user_content, Some(&observation_text));
        }

        if final_answer.is_none() {
            info!(trace_id = %trace_id, iterations, "Run ended without a final answer");
        }

        Ok(RunOutcome {
            final_answer,
            transcript: transcript.into_audit(),
            iterations,
            executions,
            trace_id: trace_id.to_string(),
        })
    }
}
