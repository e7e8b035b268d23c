//! Client core for the CodeMentor programming tutor.
//!
//! A [`ChatSession`] owns the bounded conversation history and the visible
//! transcript. Each call to [`ChatSession::send`] posts one message through a
//! [`ChatTransport`] (normally [`chat_api::ChatApiClient`]), renders the
//! streamed reply live through a [`Renderer`], and either commits the
//! exchange or rolls the partial reply back and reports the failure in the
//! transcript.
//!
//! UI shells observe a turn through [`SessionObserver`]; the terminal shell in
//! `crates/chat_terminal` is one such consumer.

pub mod config;
pub mod history;
pub mod logging;
pub mod render;
pub mod session;
pub mod transcript;

pub use crate::config::EnvConfig;
pub use crate::history::HistoryBuffer;
pub use crate::render::{HtmlRenderer, MessageRole, RenderAccumulator, Renderer, SafeMarkup};
pub use crate::session::{
    ChatSession, ChatTransport, NoopObserver, SessionObserver, SessionOptions, TurnError,
    TurnOutcome,
};
pub use crate::transcript::{EntryId, Transcript, TranscriptEntry};

pub use chat_api;
