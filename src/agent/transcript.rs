//! Dual-history transcript for a run
//!
//! A run keeps two parallel message sequences: the lean model-facing history
//! (exactly what is sent on each chat call) and the full-fidelity audit
//! transcript (same turns, plus token usage and the raw extracted code
//! blocks). Both are appended through the same call so the audit trail is a
//! superset of the model-facing history by construction, never by
//! after-the-fact reconciliation.

use serde::{Deserialize, Serialize};

use crate::llm::{Message, Role, Usage};

/// One audit-transcript entry: a conversation turn plus everything the
/// model-facing history strips out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
    /// Token accounting for assistant turns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Code fragments extracted from an assistant turn, in order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_blocks: Option<Vec<String>>,
    /// The formatted observation embedded in a user turn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_blocks_observed: Option<String>,
}

impl TranscriptEntry {
    fn from_message(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
            usage: None,
            code_blocks: None,
            code_blocks_observed: None,
        }
    }
}

/// The two append-only histories of one run
#[derive(Debug, Default)]
pub struct Transcript {
    model_facing: Vec<Message>,
    audit: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a prompt-builder message to both histories unchanged
    pub fn push_message(&mut self, message: Message) {
        self.audit.push(TranscriptEntry::from_message(&message));
        self.model_facing.push(message);
    }

    /// Append an assistant turn; the audit side keeps usage and the
    /// extracted code blocks, the model-facing side only the text
    pub fn push_assistant(
        &mut self,
        content: &str,
        usage: Option<Usage>,
        code_blocks: Option<Vec<String>>,
    ) {
        self.model_facing.push(Message::assistant(content));
        self.audit.push(TranscriptEntry {
            role: Role::Assistant,
            content: content.to_string(),
            usage,
            code_blocks,
            code_blocks_observed: None,
        });
    }

    /// Append a user turn; the audit side additionally records the raw
    /// observation text embedded in it, if any
    pub fn push_user(&mut self, content: &str, observed: Option<&str>) {
        self.model_facing.push(Message::user(content));
        self.audit.push(TranscriptEntry {
            role: Role::User,
            content: content.to_string(),
            usage: None,
            code_blocks: None,
            code_blocks_observed: observed.map(str::to_string),
        });
    }

    /// The pruned history sent to the model
    pub fn model_history(&self) -> &[Message] {
        &self.model_facing
    }

    /// The full-fidelity audit trail
    pub fn audit(&self) -> &[TranscriptEntry] {
        &self.audit
    }

    /// Consume the transcript, keeping the audit trail
    pub fn into_audit(self) -> Vec<TranscriptEntry> {
        self.audit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histories_advance_in_lockstep() {
        let mut t = Transcript::new();
        t.push_message(Message::system("sys"));
        t.push_message(Message::user("task"));
        t.push_assistant("code below", Some(Usage::default()), Some(vec!["x = 1".into()]));
        t.push_user("observation + next prompt", Some("observation"));

        assert_eq!(t.model_history().len(), 4);
        assert_eq!(t.audit().len(), 4);
        assert!(t.audit().len() >= t.model_history().len());

        // Same turns in the same order on both sides
        for (msg, entry) in t.model_history().iter().zip(t.audit()) {
            assert_eq!(msg.role, entry.role);
            assert_eq!(msg.content, entry.content);
        }
    }

    #[test]
    fn test_audit_entries_carry_extra_fields() {
        let mut t = Transcript::new();
        t.push_assistant("turn", Some(Usage::default()), Some(vec!["print(1)".into()]));

        let entry = &t.audit()[0];
        assert!(entry.usage.is_some());
        assert_eq!(entry.code_blocks.as_deref(), Some(&["print(1)".to_string()][..]));

        // The model-facing side carries none of that
        assert_eq!(t.model_history()[0].content, "turn");
    }

    #[test]
    fn test_entry_serialization_skips_absent_fields() {
        let mut t = Transcript::new();
        t.push_message(Message::system("sys"));
        let json = serde_json::to_string(&t.audit()[0]).unwrap();
        assert!(!json.contains("usage"));
        assert!(!json.contains("code_blocks"));

        t.push_user("obs", Some("raw"));
        let json = serde_json::to_string(&t.audit()[1]).unwrap();
        assert!(json.contains("\"code_blocks_observed\":\"raw\""));
    }
}
