use serde::{Deserialize, Serialize};

/// Body of `POST /v2/bot/message/push`.
#[derive(Debug, Clone, Serialize)]
pub struct PushRequest {
    pub to: String,
    pub messages: Vec<Message>,
}

impl PushRequest {
    /// A push carrying a single text message.
    pub fn text(to: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            messages: vec![Message::Text { text: text.into() }],
        }
    }
}

/// Outbound message object. Only plain text is modelled.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Text { text: String },
}

/// Error payload returned by the Messaging API on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(default)]
    pub details: Vec<ApiErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub message: Option<String>,
    pub property: Option<String>,
}
