//! Agent module for the RLM orchestration loop
//!
//! This module drives the iterate-until-done protocol between:
//! - a chat model (via the `ModelClient` trait)
//! - a sandboxed REPL environment (via the `ReplSession` trait)
//!
//! # Architecture
//!
//! ```text
//! Task + Context → RlmController → ModelClient.chat(history)
//!                       ↓
//!               extract ```repl``` blocks
//!                       ↓
//!               ReplSession.execute(code)  (per fragment, in order)
//!                       ↓
//!               done? → state() → final answer → close()
//!                       ↓ no
//!               format observation → next user turn → loop
//! ```
//!
//! Two histories are kept per run: the pruned model-facing history and the
//! full-fidelity audit transcript, appended together at every step.

pub mod controller;
pub mod transcript;

pub use controller::{RlmController, RlmError, RunConfig, RunOutcome};
pub use transcript::{Transcript, TranscriptEntry};
