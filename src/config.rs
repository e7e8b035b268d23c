//! Environment configuration.

use std::env;
use std::time::Duration;

use chat_api::url::DEFAULT_CHAT_BASE_URL;
use chat_api::{ChatApiConfig, RecordPolicy};

use crate::history::{DEFAULT_PAYLOAD_LIMIT, DEFAULT_STORE_LIMIT};
use crate::logging::DEFAULT_LOG_FILTER;
use crate::session::SessionOptions;

pub const BASE_URL_ENV_VAR: &str = "CODEMENTOR_BASE_URL";
pub const STORE_LIMIT_ENV_VAR: &str = "CODEMENTOR_STORE_LIMIT";
pub const PAYLOAD_LIMIT_ENV_VAR: &str = "CODEMENTOR_PAYLOAD_LIMIT";
pub const STREAM_TIMEOUT_ENV_VAR: &str = "CODEMENTOR_STREAM_TIMEOUT_SECS";
pub const CONNECT_TIMEOUT_ENV_VAR: &str = "CODEMENTOR_CONNECT_TIMEOUT_SECS";
pub const STRICT_RECORDS_ENV_VAR: &str = "CODEMENTOR_STRICT_RECORDS";
pub const LOG_ENV_VAR: &str = "CODEMENTOR_LOG";

const MAX_STORE_LIMIT: usize = 100;
const DEFAULT_STREAM_TIMEOUT_SECS: u64 = 90;
const MAX_STREAM_TIMEOUT_SECS: u64 = 3600;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const MAX_CONNECT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub base_url: String,
    pub store_limit: usize,
    pub payload_limit: usize,
    /// `None` disables the stall watchdog.
    pub stream_timeout: Option<Duration>,
    /// `None` leaves connection setup unbounded.
    pub connect_timeout: Option<Duration>,
    pub strict_records: bool,
    pub log_filter: String,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CHAT_BASE_URL.to_owned(),
            store_limit: DEFAULT_STORE_LIMIT,
            payload_limit: DEFAULT_PAYLOAD_LIMIT,
            stream_timeout: Some(Duration::from_secs(DEFAULT_STREAM_TIMEOUT_SECS)),
            connect_timeout: Some(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)),
            strict_records: false,
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

impl EnvConfig {
    /// Read the environment. Unparseable values fall back to defaults and
    /// numbers are clamped into range.
    pub fn from_env() -> Self {
        let store_limit = env_usize(STORE_LIMIT_ENV_VAR, DEFAULT_STORE_LIMIT, 1, MAX_STORE_LIMIT);
        let payload_limit = env_usize(PAYLOAD_LIMIT_ENV_VAR, DEFAULT_PAYLOAD_LIMIT, 1, store_limit);
        let timeout_secs = env_u64(
            STREAM_TIMEOUT_ENV_VAR,
            DEFAULT_STREAM_TIMEOUT_SECS,
            0,
            MAX_STREAM_TIMEOUT_SECS,
        );
        let connect_secs = env_u64(
            CONNECT_TIMEOUT_ENV_VAR,
            DEFAULT_CONNECT_TIMEOUT_SECS,
            0,
            MAX_CONNECT_TIMEOUT_SECS,
        );

        Self {
            base_url: env_string_opt(BASE_URL_ENV_VAR)
                .map(|value| value.trim().to_owned())
                .unwrap_or_else(|| DEFAULT_CHAT_BASE_URL.to_owned()),
            store_limit,
            payload_limit,
            stream_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            connect_timeout: (connect_secs > 0).then(|| Duration::from_secs(connect_secs)),
            strict_records: env_flag(STRICT_RECORDS_ENV_VAR),
            log_filter: env_string_opt(LOG_ENV_VAR)
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned()),
        }
    }

    pub fn record_policy(&self) -> RecordPolicy {
        if self.strict_records {
            RecordPolicy::Strict
        } else {
            RecordPolicy::Lenient
        }
    }

    pub fn api_config(&self) -> ChatApiConfig {
        ChatApiConfig::new(self.base_url.clone())
            .with_stream_timeout(self.stream_timeout)
            .with_connect_timeout(self.connect_timeout)
            .with_record_policy(self.record_policy())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions::default().with_limits(self.store_limit, self.payload_limit)
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

fn env_usize(key: &str, default: usize, min: usize, max: usize) -> usize {
    env_string_opt(key)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}

fn env_u64(key: &str, default: u64, min: u64, max: u64) -> u64 {
    env_string_opt(key)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}
