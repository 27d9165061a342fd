//! REPL environment integration
//!
//! Everything the orchestration loop needs at the sandbox boundary:
//!
//! - `session` - the `ReplSession` trait and observation types
//! - `remote` - HTTP-backed session against a remote environment service
//! - `prompts` - system/user prompt construction and context metadata
//! - `extract` - fenced code block extraction from model responses
//! - `observation` - observation formatting for model consumption

pub mod extract;
pub mod observation;
pub mod prompts;
pub mod remote;
pub mod session;

pub use extract::extract_code_blocks;
pub use observation::format_observation;
pub use prompts::{build_system_prompt, build_user_prompt, QueryMetadata, NO_CODE_PROMPT, REPL_SYSTEM_PROMPT};
pub use remote::RemoteReplSession;
pub use session::{ExecutionResult, Observation, ReplSession, RunState, SessionError, StepResult};
