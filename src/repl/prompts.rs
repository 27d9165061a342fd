//! Prompt construction for the REPL loop
//!
//! Two jobs: the initial system message anchoring the execution protocol and
//! the shape of the loaded context, and the per-iteration user turn that
//! restates the task and the model's progress. Both are pure functions of
//! their inputs.

use serde::{Deserialize, Serialize};

use crate::llm::Message;

/// Fixed system instruction describing the REPL protocol
pub const REPL_SYSTEM_PROMPT: &str = r#"You are solving a task over a context that is too large to read at once. You interact with it through a persistent Python REPL.

The REPL is pre-loaded with:
- `context`: the full task context as a string
- `llm_query(prompt)`: ask a sub-LLM a question about a piece of text you pass in
- `llm_query_batched(prompts)`: the same, for a list of prompts
- `FINAL(answer)`: call this with your final answer to finish the task

Rules:
- Put any code you want executed in a fenced block tagged repl, like:
```repl
print(len(context))
```
- Work incrementally: inspect slices of `context`, narrow down, then answer.
- Variables persist between iterations.
- Only code in ```repl``` blocks is executed. At most a few short blocks per turn.
- When you are confident, call FINAL(answer) inside a ```repl``` block."#;

/// Corrective instruction appended when a response contains no runnable code
pub const NO_CODE_PROMPT: &str = "Please provide code in ```repl``` blocks.";

/// Size and shape of the task's input context, derived once per run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryMetadata {
    /// Character length of each context chunk, in order
    pub context_lengths: Vec<usize>,
    /// Total character length across all chunks
    pub context_total_length: usize,
    /// Tag describing the context's type (e.g. "str")
    pub context_type: String,
}

impl QueryMetadata {
    /// Metadata for a single undivided string context
    pub fn single(context_length: usize) -> Self {
        Self {
            context_lengths: vec![context_length],
            context_total_length: context_length,
            context_type: "str".to_string(),
        }
    }

    /// Render the metadata as a prompt fragment
    fn render(&self) -> String {
        format!(
            "The `context` variable is a {} made of {} chunk(s) with lengths {:?} ({} characters total).",
            self.context_type,
            self.context_lengths.len(),
            self.context_lengths,
            self.context_total_length
        )
    }
}

/// Build the initial message sequence: the system instruction plus a
/// rendering of the context metadata.
pub fn build_system_prompt(system: &str, metadata: &QueryMetadata) -> Vec<Message> {
    vec![Message::system(format!("{}\n\n{}", system, metadata.render()))]
}

/// Build the user turn for one iteration, restating the task so the model
/// keeps sight of the objective regardless of how much history was pruned.
pub fn build_user_prompt(root_prompt: &str, iteration: usize) -> Message {
    Message::user(format!(
        "Task: {}\n\nYou are on iteration {}. Use the REPL to make progress, and call FINAL(answer) when you know the answer.",
        root_prompt, iteration
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn test_system_prompt_includes_metadata() {
        let meta = QueryMetadata::single(12345);
        let messages = build_system_prompt(REPL_SYSTEM_PROMPT, &meta);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("```repl"));
        assert!(messages[0].content.contains("12345 characters total"));
    }

    #[test]
    fn test_user_prompt_embeds_task_and_iteration() {
        let msg = build_user_prompt("What is 2+2?", 3);
        assert_eq!(msg.role, Role::User);
        assert!(msg.content.contains("What is 2+2?"));
        assert!(msg.content.contains("iteration 3"));
    }

    #[test]
    fn test_builders_are_referentially_transparent() {
        let meta = QueryMetadata::single(10);
        assert_eq!(
            build_system_prompt(REPL_SYSTEM_PROMPT, &meta),
            build_system_prompt(REPL_SYSTEM_PROMPT, &meta)
        );
        assert_eq!(build_user_prompt("t", 1), build_user_prompt("t", 1));
    }

    #[test]
    fn test_metadata_multi_chunk_render() {
        let meta = QueryMetadata {
            context_lengths: vec![100, 200],
            context_total_length: 300,
            context_type: "str".to_string(),
        };
        let rendered = meta.render();
        assert!(rendered.contains("2 chunk(s)"));
        assert!(rendered.contains("[100, 200]"));
    }
}
