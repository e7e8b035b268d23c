//! Request lifecycle for one chat session.
//!
//! [`ChatSession::send`] drives a single turn end to end: it snapshots the
//! request window, records the user turn, opens the reply, renders fragments
//! into a streaming transcript entry, and then either commits the assistant
//! turn or removes every trace of it and reports the failure as a system
//! entry. The user turn stays in history either way.

use std::future::Future;
use std::sync::Arc;

use chat_api::payload::MAX_MESSAGE_CHARS;
use chat_api::{ChatApiClient, ChatApiError, ChatReply, ChatRequest, ChatStreamEvent, Turn};
use thiserror::Error;

use crate::history::{HistoryBuffer, DEFAULT_PAYLOAD_LIMIT, DEFAULT_STORE_LIMIT};
use crate::render::{HtmlRenderer, MessageRole, RenderAccumulator, Renderer, SafeMarkup};
use crate::transcript::{EntryId, Transcript, TranscriptEntry};

pub const DEFAULT_WELCOME_MESSAGE: &str = "Olá! 👋 Eu sou o **CodeMentor**, seu mentor de lógica de programação.\nPergunte sobre variáveis, laços, funções ou qualquer conceito que esteja estudando.";
pub const ERROR_PREFIX: &str = "❌ **Erro:**";
pub const ERROR_HINT: &str =
    "Verifique se o servidor do modelo está disponível e tente novamente.";

/// Opens one reply for a request.
pub trait ChatTransport {
    fn open_turn(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<ChatReply, ChatApiError>>;
}

impl ChatTransport for ChatApiClient {
    async fn open_turn(&self, request: &ChatRequest) -> Result<ChatReply, ChatApiError> {
        self.open(request).await
    }
}

/// UI hooks invoked while a turn is in flight. Every method has an empty
/// default.
pub trait SessionObserver {
    /// The user entry was appended to the transcript.
    fn on_turn_started(&mut self, _entry: &TranscriptEntry) {}

    /// The streaming assistant entry changed. `fragment` is the newly received
    /// text; the entry holds everything received so far.
    fn on_fragment(&mut self, _entry: &TranscriptEntry, _fragment: &str) {}

    /// A streaming entry was removed from the transcript.
    fn on_discarded(&mut self, _entry: EntryId) {}

    fn on_error(&mut self, _error: &TurnError, _entry: &TranscriptEntry) {}

    /// Called once per [`ChatSession::send`], blank input included.
    fn on_settled(&mut self, _outcome: &TurnOutcome) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Api(#[from] ChatApiError),
    #[error("Nenhum conteúdo recebido do modelo.")]
    Empty,
    #[error("Mensagem muito longa ({chars} caracteres; o máximo é {max}).")]
    TooLong { chars: usize, max: usize },
}

#[derive(Debug)]
pub enum TurnOutcome {
    /// Blank input; nothing was sent.
    Ignored,
    /// The assistant entry was finalized and recorded in history.
    Committed { entry: EntryId },
    /// The turn was rolled back and `entry` is the system error message.
    Failed { error: TurnError, entry: EntryId },
}

impl TurnOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    pub fn error(&self) -> Option<&TurnError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub store_limit: usize,
    pub payload_limit: usize,
    pub welcome: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            store_limit: DEFAULT_STORE_LIMIT,
            payload_limit: DEFAULT_PAYLOAD_LIMIT,
            welcome: Some(DEFAULT_WELCOME_MESSAGE.to_owned()),
        }
    }
}

impl SessionOptions {
    pub fn with_limits(mut self, store_limit: usize, payload_limit: usize) -> Self {
        self.store_limit = store_limit;
        self.payload_limit = payload_limit;
        self
    }

    pub fn with_welcome(mut self, welcome: Option<String>) -> Self {
        self.welcome = welcome
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());
        self
    }
}

/// Text of the system entry shown for a failed turn.
pub fn error_message(error: &TurnError) -> String {
    format!("{ERROR_PREFIX} {error}\n\n{ERROR_HINT}")
}

pub struct ChatSession<T> {
    transport: T,
    history: HistoryBuffer,
    transcript: Transcript,
    renderer: Arc<dyn Renderer + Send + Sync>,
}

impl<T: ChatTransport> ChatSession<T> {
    pub fn new(transport: T, options: SessionOptions) -> Self {
        Self::with_renderer(transport, options, Arc::new(HtmlRenderer::new()))
    }

    pub fn with_renderer(
        transport: T,
        options: SessionOptions,
        renderer: Arc<dyn Renderer + Send + Sync>,
    ) -> Self {
        let mut transcript = Transcript::new();
        if let Some(welcome) = options.welcome {
            let markup = renderer.render(&welcome, MessageRole::Assistant);
            transcript.push_welcome(welcome, markup);
        }

        Self {
            transport,
            history: HistoryBuffer::new(options.store_limit, options.payload_limit),
            transcript,
            renderer,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Forget the conversation. The welcome entry stays visible.
    pub fn clear(&mut self) {
        self.history.clear();
        self.transcript.clear();
        tracing::debug!("session cleared");
    }

    /// Remove the in-progress reply left behind when a [`ChatSession::send`]
    /// future is dropped before it settles. The user turn stays in history.
    pub fn discard_interrupted(&mut self) -> Option<TranscriptEntry> {
        let id = self.transcript.streaming_entry()?.id;
        tracing::debug!(entry = id, "discarding interrupted reply");
        self.transcript.remove(id)
    }

    /// Run one turn to completion.
    ///
    /// Never returns an error: failures are rendered into the transcript and
    /// reported through [`TurnOutcome::Failed`].
    pub async fn send(&mut self, text: &str, observer: &mut dyn SessionObserver) -> TurnOutcome {
        let message = text.trim();
        if message.is_empty() {
            let outcome = TurnOutcome::Ignored;
            observer.on_settled(&outcome);
            return outcome;
        }

        let chars = message.chars().count();
        if chars > MAX_MESSAGE_CHARS {
            let error = TurnError::TooLong {
                chars,
                max: MAX_MESSAGE_CHARS,
            };
            return self.fail(error, None, observer);
        }

        // The window is taken before the pending turn is recorded.
        let request = ChatRequest::new(message, self.request_window());
        self.history.append(Turn::user(message));

        let markup = self.renderer.render(message, MessageRole::User);
        let user_entry = self
            .transcript
            .push(MessageRole::User, message, markup, false);
        if let Some(entry) = self.transcript.get(user_entry) {
            observer.on_turn_started(entry);
        }

        let mut placeholder = None;
        match self.stream_reply(&request, &mut placeholder, observer).await {
            Ok((entry, text)) => self.commit(entry, text, observer),
            Err(error) => self.fail(error, placeholder, observer),
        }
    }

    /// Trailing history for the next request, each turn clipped to the
    /// length the relay accepts.
    fn request_window(&self) -> Vec<Turn> {
        let mut window = self.history.truncated_for_request();
        for turn in &mut window {
            if let Some((index, _)) = turn.content.char_indices().nth(MAX_MESSAGE_CHARS) {
                turn.content.truncate(index);
            }
        }
        window
    }

    async fn stream_reply(
        &mut self,
        request: &ChatRequest,
        placeholder: &mut Option<EntryId>,
        observer: &mut dyn SessionObserver,
    ) -> Result<(EntryId, String), TurnError> {
        let reply = self.transport.open_turn(request).await?;

        let entry = self
            .transcript
            .push(MessageRole::Assistant, "", SafeMarkup::default(), true);
        *placeholder = Some(entry);
        let mut accumulator =
            RenderAccumulator::new(Arc::clone(&self.renderer), MessageRole::Assistant);

        match reply {
            ChatReply::Complete(text) => {
                self.apply_fragment(entry, &mut accumulator, &text, observer);
            }
            ChatReply::Stream(mut stream) => {
                while let Some(event) = stream.next_event().await {
                    match event? {
                        ChatStreamEvent::Chunk { text } => {
                            self.apply_fragment(entry, &mut accumulator, &text, observer);
                        }
                        ChatStreamEvent::Done => break,
                    }
                }
            }
        }

        if accumulator.text().trim().is_empty() {
            return Err(TurnError::Empty);
        }
        Ok((entry, accumulator.into_text()))
    }

    fn apply_fragment(
        &mut self,
        entry: EntryId,
        accumulator: &mut RenderAccumulator,
        fragment: &str,
        observer: &mut dyn SessionObserver,
    ) {
        if fragment.is_empty() {
            return;
        }
        let markup = accumulator.push(fragment).clone();
        if let Some(updated) = self.transcript.update(entry, accumulator.text(), markup) {
            observer.on_fragment(updated, fragment);
        }
    }

    fn commit(
        &mut self,
        entry: EntryId,
        text: String,
        observer: &mut dyn SessionObserver,
    ) -> TurnOutcome {
        self.transcript.finalize(entry);
        self.history.append(Turn::assistant(text));
        tracing::debug!(entry, history = self.history.len(), "chat turn committed");

        let outcome = TurnOutcome::Committed { entry };
        observer.on_settled(&outcome);
        outcome
    }

    fn fail(
        &mut self,
        error: TurnError,
        placeholder: Option<EntryId>,
        observer: &mut dyn SessionObserver,
    ) -> TurnOutcome {
        if let Some(id) = placeholder {
            if self.transcript.remove(id).is_some() {
                observer.on_discarded(id);
            }
        }
        tracing::warn!(error = %error, "chat turn failed");

        let message = error_message(&error);
        let markup = self.renderer.render(&message, MessageRole::System);
        let entry = self
            .transcript
            .push(MessageRole::System, message, markup, false);
        if let Some(visible) = self.transcript.get(entry) {
            observer.on_error(&error, visible);
        }

        let outcome = TurnOutcome::Failed { error, entry };
        observer.on_settled(&outcome);
        outcome
    }
}
