// OpenAI summarization provider
//
// Implements siren_core::Summarizer against the chat-completions endpoint.
// The call is synchronous request/response (no streaming) and bounded by a
// hard timeout so the gated alert flow can never hang on the collaborator.

mod client;

pub use client::{OpenAiSummarizer, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
