/// Default relay base URL for local development.
pub const DEFAULT_CHAT_BASE_URL: &str = "http://localhost:8000";

/// Path of the streaming chat endpoint.
pub const CHAT_STREAM_PATH: &str = "/api/chat/stream";

/// Normalize a base URL to the streaming chat endpoint.
///
/// Normalization rules:
/// 1) keep `/api/chat/stream` unchanged
/// 2) append `/stream` when path ends in `/api/chat`
/// 3) append `/chat/stream` when path ends in `/api`
/// 4) append `/api/chat/stream` otherwise
pub fn normalize_chat_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_CHAT_BASE_URL
    } else {
        input.trim()
    };

    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with(CHAT_STREAM_PATH) {
        return trimmed.to_string();
    }
    if trimmed.ends_with("/api/chat") {
        return format!("{trimmed}/stream");
    }
    if trimmed.ends_with("/api") {
        return format!("{trimmed}/chat/stream");
    }
    format!("{trimmed}{CHAT_STREAM_PATH}")
}
