use serde_json::Value;

use crate::error::{ChatApiError, GENERIC_ERROR_DETAIL};
use crate::sse::EventRecord;

/// Payload marking the logical end of the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// How a record whose payload is not valid JSON is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordPolicy {
    /// Log the record and keep streaming.
    #[default]
    Lenient,
    /// Fail the whole turn.
    Strict,
}

/// Classification of one record payload, before policy is applied.
#[derive(Debug)]
pub enum ParsedRecord {
    Chunk(String),
    Done,
    Error(String),
    Ignored,
    Malformed(serde_json::Error),
}

/// Stream event surfaced to callers after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatStreamEvent {
    Chunk { text: String },
    Done,
}

/// Classify a trimmed record payload.
pub fn parse_record(payload: &str) -> ParsedRecord {
    if payload.is_empty() {
        return ParsedRecord::Ignored;
    }
    if payload == DONE_SENTINEL {
        return ParsedRecord::Done;
    }

    let value = match serde_json::from_str::<Value>(payload) {
        Ok(value) => value,
        Err(error) => return ParsedRecord::Malformed(error),
    };

    let Value::Object(fields) = value else {
        return ParsedRecord::Ignored;
    };

    match fields.get("error") {
        None | Some(Value::Null) => {}
        Some(Value::String(message)) if message.trim().is_empty() => {
            return ParsedRecord::Error(GENERIC_ERROR_DETAIL.to_owned())
        }
        Some(Value::String(message)) => return ParsedRecord::Error(message.clone()),
        Some(other) => return ParsedRecord::Error(other.to_string()),
    }

    match fields.get("chunk") {
        Some(Value::String(text)) if !text.is_empty() => ParsedRecord::Chunk(text.clone()),
        _ => ParsedRecord::Ignored,
    }
}

/// Applies a [`RecordPolicy`] on top of [`parse_record`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EventParser {
    policy: RecordPolicy,
}

impl EventParser {
    pub fn new(policy: RecordPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RecordPolicy {
        self.policy
    }

    /// Returns `Ok(None)` for records that carry nothing for the caller.
    pub fn classify(&self, record: &EventRecord) -> Result<Option<ChatStreamEvent>, ChatApiError> {
        match parse_record(&record.payload) {
            ParsedRecord::Chunk(text) => Ok(Some(ChatStreamEvent::Chunk { text })),
            ParsedRecord::Done => Ok(Some(ChatStreamEvent::Done)),
            ParsedRecord::Error(message) => Err(ChatApiError::Declared(message)),
            ParsedRecord::Ignored => Ok(None),
            ParsedRecord::Malformed(source) => match self.policy {
                RecordPolicy::Lenient => {
                    tracing::warn!(
                        payload = %record.payload,
                        error = %source,
                        "skipping malformed stream record"
                    );
                    Ok(None)
                }
                RecordPolicy::Strict => Err(ChatApiError::MalformedRecord {
                    payload: record.payload.clone(),
                    source,
                }),
            },
        }
    }
}
