use std::collections::BTreeMap;
use std::time::Duration;

use crate::events::RecordPolicy;
use crate::url::DEFAULT_CHAT_BASE_URL;

/// Idle bound applied to each stream read unless overridden.
pub const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(90);

/// Transport configuration for chat relay requests.
#[derive(Debug, Clone)]
pub struct ChatApiConfig {
    /// Relay base URL; normalized to the streaming endpoint on use.
    pub base_url: String,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Additional headers merged into request headers.
    pub extra_headers: BTreeMap<String, String>,
    /// Maximum silence tolerated between two stream reads. `None` waits forever.
    pub stream_timeout: Option<Duration>,
    /// Optional connect timeout for establishing the TCP/TLS session.
    pub connect_timeout: Option<Duration>,
    /// How unparseable stream records are treated.
    pub record_policy: RecordPolicy,
}

impl Default for ChatApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CHAT_BASE_URL.to_string(),
            user_agent: None,
            extra_headers: BTreeMap::new(),
            stream_timeout: Some(DEFAULT_STREAM_TIMEOUT),
            connect_timeout: None,
            record_policy: RecordPolicy::default(),
        }
    }
}

impl ChatApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Bounds the wait for each stream read. `None` disables the watchdog.
    pub fn with_stream_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stream_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_record_policy(mut self, policy: RecordPolicy) -> Self {
        self.record_policy = policy;
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }
}
