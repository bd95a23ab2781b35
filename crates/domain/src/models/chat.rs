//! Chat session domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Ai => write!(f, "ai"),
        }
    }
}

/// A chat session owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChatSession {
    pub id: Uuid,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
}

/// A message within a chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub sender: Sender,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Request payload to start a chat session.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StartSessionRequest {
    #[serde(default)]
    #[validate(email(message = "A valid user_email is required"))]
    pub user_email: String,
}

/// Response after starting a chat session.
#[derive(Debug, Clone, Serialize)]
pub struct StartSessionResponse {
    pub session_id: Uuid,
}

/// Request payload for sending a chat message.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub session_id: Uuid,

    #[serde(default)]
    #[validate(length(min = 1, max = 4000, message = "Message must be between 1 and 4000 characters"))]
    pub message: String,
}

/// Reply to a chat message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ChatReplyResponse {
    pub reply: String,
    pub emotion: String,
    pub calming_tip: String,
}

/// Response for listing sessions.
#[derive(Debug, Clone, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<ChatSession>,
}

/// Response for a session's message history.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<ChatMessage>,
}

/// Request payload for a guided meditation script.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GuidedMeditationRequest {
    #[serde(default = "default_meditation_kind", rename = "type")]
    #[validate(length(min = 1, max = 100, message = "Type must be between 1 and 100 characters"))]
    pub kind: String,
}

/// A guided meditation script.
#[derive(Debug, Clone, Serialize)]
pub struct GuidedMeditationResponse {
    pub success: bool,
    pub text: String,
}

/// Chat message counts per calendar month (`YYYY-MM`), oldest first.
///
/// The dashboard charts this series as monthly users, hence the field name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MonthlyActivityResponse {
    pub months: Vec<String>,
    pub users: Vec<i64>,
}

impl FromIterator<(String, i64)> for MonthlyActivityResponse {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        let mut response = Self::default();
        for (month, count) in iter {
            response.months.push(month);
            response.users.push(count);
        }
        response
    }
}

fn default_meditation_kind() -> String {
    "relaxation".to_string()
}
