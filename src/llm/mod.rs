//! LLM integration module
//!
//! Provides the `ModelClient` trait the orchestration loop calls through,
//! plus a concrete client for OpenAI-compatible chat completion APIs.

pub mod client;

pub use client::{ChatError, ChatTurn, Message, ModelClient, OpenAiChatClient, Role, Usage};
