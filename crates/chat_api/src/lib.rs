//! Transport-only client primitives for the CodeMentor chat relay.
//!
//! This crate owns request building, response classification and stream
//! parsing for the relay's chat endpoint. It holds no conversation state and no
//! rendering; callers own history and presentation.
//!
//! The streaming wire format is one record per line, `data: <payload>`, where
//! the payload is `[DONE]`, `{"chunk": "..."}` or `{"error": "..."}`. A relay
//! answering with `application/json` instead returns `{"response": "..."}` in
//! one piece; [`ChatReply`] covers both shapes.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod headers;
pub mod payload;
pub mod sse;
pub mod url;

pub use client::{ChatApiClient, ChatReply, ChatStream};
pub use config::ChatApiConfig;
pub use error::ChatApiError;
pub use events::{ChatStreamEvent, EventParser, ParsedRecord, RecordPolicy, DONE_SENTINEL};
pub use payload::{ChatRequest, ChatResponse, Role, Turn};
pub use sse::{EventRecord, StreamDecoder};
pub use url::normalize_chat_url;

pub use reqwest::StatusCode;
