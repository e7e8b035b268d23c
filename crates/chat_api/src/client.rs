use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response};

use crate::config::ChatApiConfig;
use crate::error::{parse_error_detail, ChatApiError};
use crate::events::{ChatStreamEvent, EventParser, RecordPolicy};
use crate::headers::build_headers;
use crate::payload::{ChatRequest, ChatResponse};
use crate::sse::{EventRecord, StreamDecoder};
use crate::url::normalize_chat_url;

#[derive(Debug)]
pub struct ChatApiClient {
    http: Client,
    config: ChatApiConfig,
    endpoint: String,
}

/// Successful reply, shaped by the response content type.
#[derive(Debug)]
pub enum ChatReply {
    /// `text/event-stream` (or any non-JSON type): records arrive incrementally.
    Stream(ChatStream),
    /// `application/json`: the whole answer in one body.
    Complete(String),
}

impl ChatReply {
    /// Drain the reply into its full text.
    pub async fn into_text(self) -> Result<String, ChatApiError> {
        match self {
            Self::Complete(text) => Ok(text),
            Self::Stream(mut stream) => {
                let mut text = String::new();
                while let Some(event) = stream.next_event().await {
                    match event? {
                        ChatStreamEvent::Chunk { text: chunk } => text.push_str(&chunk),
                        ChatStreamEvent::Done => break,
                    }
                }
                Ok(text)
            }
        }
    }
}

impl ChatApiClient {
    pub fn new(config: ChatApiConfig) -> Result<Self, ChatApiError> {
        let endpoint = normalize_chat_url(&config.base_url);
        let parsed = url::Url::parse(&endpoint)
            .map_err(|error| ChatApiError::InvalidBaseUrl(format!("{endpoint}: {error}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ChatApiError::InvalidBaseUrl(format!(
                "{endpoint}: unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            config,
            endpoint,
        })
    }

    pub fn config(&self) -> &ChatApiConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn build_headers(&self) -> Result<HeaderMap, ChatApiError> {
        let mut out = HeaderMap::new();
        for (key, value) in build_headers(&self.config) {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                ChatApiError::InvalidHeader {
                    name: key.clone(),
                    reason: "invalid header name",
                }
            })?;
            let value = HeaderValue::from_str(&value).map_err(|_| ChatApiError::InvalidHeader {
                name: key.clone(),
                reason: "invalid header value",
            })?;
            out.insert(name, value);
        }
        Ok(out)
    }

    pub fn build_request(
        &self,
        request: &ChatRequest,
    ) -> Result<reqwest::RequestBuilder, ChatApiError> {
        let headers = self.build_headers()?;
        Ok(self.http.post(&self.endpoint).headers(headers).json(request))
    }

    /// POST one chat request and classify the response.
    ///
    /// Non-2xx responses are read whole and turned into
    /// [`ChatApiError::Status`] carrying the body's `detail`.
    pub async fn open(&self, request: &ChatRequest) -> Result<ChatReply, ChatApiError> {
        let timeout = self.config.stream_timeout;
        tracing::debug!(
            endpoint = %self.endpoint,
            history = request.history.len(),
            "sending chat request"
        );

        let response = within(timeout, self.build_request(request)?.send()).await??;
        let status = response.status();

        if !status.is_success() {
            let body = within(timeout, response.text())
                .await?
                .unwrap_or_default();
            let detail = parse_error_detail(&body);
            tracing::warn!(status = status.as_u16(), %detail, "chat request failed");
            return Err(ChatApiError::Status { status, detail });
        }

        if is_json_response(&response) {
            let body = within(timeout, response.text()).await??;
            let parsed = serde_json::from_str::<ChatResponse>(&body)
                .map_err(|error| ChatApiError::InvalidResponseBody(error.to_string()))?;
            return Ok(ChatReply::Complete(parsed.response));
        }

        Ok(ChatReply::Stream(ChatStream::from_response(
            response,
            self.config.record_policy,
            timeout,
        )))
    }
}

fn is_json_response(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .eq_ignore_ascii_case("application/json")
        })
        .unwrap_or(false)
}

/// Lazy, finite, non-restartable sequence of stream events for one request.
///
/// Dropping the value closes the underlying connection. After the sentinel or
/// the first error the body is released and [`ChatStream::next_event`] keeps
/// returning `None`.
pub struct ChatStream {
    body: Option<BoxStream<'static, Result<Bytes, ChatApiError>>>,
    decoder: StreamDecoder,
    parser: EventParser,
    pending: VecDeque<EventRecord>,
    idle_timeout: Option<Duration>,
    finished: bool,
}

impl fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatStream")
            .field("open", &self.body.is_some())
            .field("pending", &self.pending.len())
            .field("policy", &self.parser.policy())
            .field("idle_timeout", &self.idle_timeout)
            .field("finished", &self.finished)
            .finish()
    }
}

impl ChatStream {
    pub fn from_response(
        response: Response,
        policy: RecordPolicy,
        idle_timeout: Option<Duration>,
    ) -> Self {
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ChatApiError::from));
        Self::from_byte_stream(body, policy, idle_timeout)
    }

    pub fn from_byte_stream<S>(
        stream: S,
        policy: RecordPolicy,
        idle_timeout: Option<Duration>,
    ) -> Self
    where
        S: Stream<Item = Result<Bytes, ChatApiError>> + Send + 'static,
    {
        Self {
            body: Some(stream.boxed()),
            decoder: StreamDecoder::default(),
            parser: EventParser::new(policy),
            pending: VecDeque::new(),
            idle_timeout,
            finished: false,
        }
    }

    /// Build a stream over in-memory chunks, delivered in order.
    pub fn from_chunks<I, B>(chunks: I, policy: RecordPolicy) -> Self
    where
        I: IntoIterator<Item = B>,
        I::IntoIter: Send + 'static,
        B: Into<Bytes>,
    {
        let body = futures_util::stream::iter(chunks.into_iter().map(|chunk| Ok(chunk.into())));
        Self::from_byte_stream(body, policy, None)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the body is exhausted or the stream was closed by
    /// the sentinel or an error.
    pub async fn next_event(&mut self) -> Option<Result<ChatStreamEvent, ChatApiError>> {
        loop {
            if self.finished {
                return None;
            }

            while let Some(record) = self.pending.pop_front() {
                match self.parser.classify(&record) {
                    Ok(None) => {}
                    Ok(Some(ChatStreamEvent::Done)) => {
                        self.close();
                        return Some(Ok(ChatStreamEvent::Done));
                    }
                    Ok(Some(event)) => return Some(Ok(event)),
                    Err(error) => {
                        self.close();
                        return Some(Err(error));
                    }
                }
            }

            let Some(body) = self.body.as_mut() else {
                self.finished = true;
                return None;
            };

            let next = match within(self.idle_timeout, body.next()).await {
                Ok(next) => next,
                Err(error) => {
                    self.close();
                    return Some(Err(error));
                }
            };

            match next {
                Some(Ok(bytes)) => self.pending.extend(self.decoder.feed(&bytes)),
                Some(Err(error)) => {
                    self.close();
                    return Some(Err(error));
                }
                None => {
                    self.decoder.finish();
                    self.body = None;
                }
            }
        }
    }

    fn close(&mut self) {
        self.body = None;
        self.pending.clear();
        self.finished = true;
    }
}

async fn within<F>(timeout: Option<Duration>, future: F) -> Result<F::Output, ChatApiError>
where
    F: Future,
{
    match timeout {
        None => Ok(future.await),
        Some(after) => tokio::time::timeout(after, future)
            .await
            .map_err(|_| ChatApiError::Stalled { after }),
    }
}
