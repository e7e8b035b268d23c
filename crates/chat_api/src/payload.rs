use serde::{Deserialize, Serialize};

/// Upper bound the relay accepts for a single message body, in characters.
pub const MAX_MESSAGE_CHARS: usize = 1500;

/// Author of a model-facing conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message exchanged with the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request body accepted by the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<Turn>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, history: Vec<Turn>) -> Self {
        Self {
            message: message.into(),
            history,
        }
    }
}

/// Body of a non-streamed reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::{ChatRequest, Turn};
    use serde_json::json;

    #[test]
    fn request_serializes_roles_in_lowercase() {
        let request = ChatRequest::new(
            "O que é uma variável?",
            vec![Turn::user("Oi!"), Turn::assistant("Olá, como posso ajudar?")],
        );

        let value = serde_json::to_value(&request).expect("request serializes");
        assert_eq!(
            value,
            json!({
                "message": "O que é uma variável?",
                "history": [
                    {"role": "user", "content": "Oi!"},
                    {"role": "assistant", "content": "Olá, como posso ajudar?"},
                ],
            })
        );
    }

    #[test]
    fn request_history_defaults_to_empty() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"message":"oi"}"#).expect("history is optional");
        assert!(request.history.is_empty());
    }
}
