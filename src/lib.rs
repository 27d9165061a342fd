//! rlm-agent - REPL-driven language model orchestration
//!
//! Drives an iterative "reason + execute + observe" loop: a chat model
//! proposes code in fenced ```repl``` blocks, a sandboxed REPL environment
//! executes it, and the formatted result feeds the next model turn, until
//! the environment signals a final answer or the iteration budget runs out.
//!
//! # Modules
//!
//! - `agent` - the orchestration loop and the dual-history transcript
//! - `repl` - code extraction, prompt building, observation formatting, and
//!   the sandbox session boundary
//! - `llm` - the model-call collaborator (OpenAI-compatible chat client)
//! - `server` - HTTP API, dataset retrieval, and on-disk caching
//! - `config` - environment-derived service configuration
//! - `metrics` - Prometheus metrics
//! - `tracing` - log/trace subscriber setup
//!
//! # Quick Start
//!
//! ```ignore
//! use rlm_agent::agent::{RlmController, RunConfig};
//! use rlm_agent::llm::OpenAiChatClient;
//! use rlm_agent::repl::RemoteReplSession;
//!
//! let model = OpenAiChatClient::new(base_url, api_key, "openai/gpt-4.1-nano");
//! let controller = RlmController::new(model, RunConfig::default());
//! let session = RemoteReplSession::new(env_url);
//! let outcome = controller.run(session, &context, &question, None).await?;
//! ```

pub mod agent;
pub mod config;
pub mod llm;
pub mod metrics;
pub mod repl;
pub mod server;
pub mod tracing;

// Re-export commonly used types at crate root for convenience
pub use agent::{RlmController, RlmError, RunConfig, RunOutcome, TranscriptEntry};
pub use llm::{Message, ModelClient, OpenAiChatClient};
pub use repl::{RemoteReplSession, ReplSession};
