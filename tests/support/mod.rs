#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use bytes::Bytes;
use futures_util::StreamExt;

use codementor::chat_api::{
    ChatApiError, ChatReply, ChatRequest, ChatStream, RecordPolicy, StatusCode,
};
use codementor::transcript::EntryId;
use codementor::{ChatTransport, SessionObserver, TranscriptEntry, TurnError, TurnOutcome};

pub enum Script {
    Stream(Vec<Vec<u8>>),
    /// Delivers the chunks, then never ends.
    StreamThenHang(Vec<Vec<u8>>),
    Complete(String),
    Fail(ChatApiError),
}

/// Stream script built from record payloads, one `data:` line each.
pub fn stream(payloads: &[&str]) -> Script {
    Script::Stream(
        payloads
            .iter()
            .map(|payload| format!("data: {payload}\n").into_bytes())
            .collect(),
    )
}

/// `{"chunk": text}` with the escaping the fixtures need.
pub fn chunk(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    format!("{{\"chunk\":\"{escaped}\"}}")
}

pub fn status(code: u16, detail: &str) -> Script {
    Script::Fail(ChatApiError::Status {
        status: StatusCode::from_u16(code).expect("valid status code"),
        detail: detail.to_owned(),
    })
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, script: Script) {
        lock(&self.scripts).push_back(script);
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }
}

impl ChatTransport for ScriptedTransport {
    async fn open_turn(&self, request: &ChatRequest) -> Result<ChatReply, ChatApiError> {
        lock(&self.requests).push(request.clone());
        let script = lock(&self.scripts).pop_front();
        match script {
            Some(Script::Stream(chunks)) => Ok(ChatReply::Stream(ChatStream::from_chunks(
                chunks,
                RecordPolicy::Lenient,
            ))),
            Some(Script::StreamThenHang(chunks)) => {
                let body = futures_util::stream::iter(
                    chunks.into_iter().map(|chunk| Ok(Bytes::from(chunk))),
                )
                .chain(futures_util::stream::pending());
                Ok(ChatReply::Stream(ChatStream::from_byte_stream(
                    body,
                    RecordPolicy::Lenient,
                    None,
                )))
            }
            Some(Script::Complete(text)) => Ok(ChatReply::Complete(text)),
            Some(Script::Fail(error)) => Err(error),
            None => Err(ChatApiError::Declared("no scripted reply".to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seen {
    Started(String),
    Fragment { fragment: String, content: String },
    Discarded(EntryId),
    Error(String),
    Committed,
    Failed,
    Ignored,
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub seen: Vec<Seen>,
}

impl SessionObserver for Recorder {
    fn on_turn_started(&mut self, entry: &TranscriptEntry) {
        self.seen.push(Seen::Started(entry.content.clone()));
    }

    fn on_fragment(&mut self, entry: &TranscriptEntry, fragment: &str) {
        self.seen.push(Seen::Fragment {
            fragment: fragment.to_owned(),
            content: entry.content.clone(),
        });
    }

    fn on_discarded(&mut self, entry: EntryId) {
        self.seen.push(Seen::Discarded(entry));
    }

    fn on_error(&mut self, _error: &TurnError, entry: &TranscriptEntry) {
        self.seen.push(Seen::Error(entry.content.clone()));
    }

    fn on_settled(&mut self, outcome: &TurnOutcome) {
        self.seen.push(match outcome {
            TurnOutcome::Committed { .. } => Seen::Committed,
            TurnOutcome::Failed { .. } => Seen::Failed,
            TurnOutcome::Ignored => Seen::Ignored,
        });
    }
}
