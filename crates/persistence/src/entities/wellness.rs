//! Mood, chat and assessment entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::assessment::Assessment;
use domain::models::chat::{ChatMessage, ChatSession, Sender};
use domain::models::mood::MoodLog;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the mood_logs table.
#[derive(Debug, Clone, FromRow)]
pub struct MoodLogEntity {
    pub id: Uuid,
    pub user_email: String,
    pub mood: String,
    pub intensity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<MoodLogEntity> for MoodLog {
    fn from(entity: MoodLogEntity) -> Self {
        Self {
            id: entity.id,
            user_email: entity.user_email,
            mood: entity.mood,
            intensity: entity.intensity,
            created_at: entity.created_at,
        }
    }
}

/// Aggregated mood count row.
#[derive(Debug, Clone, FromRow)]
pub struct MoodCountEntity {
    pub mood: String,
    pub count: i64,
}

/// Message count for one calendar month.
#[derive(Debug, Clone, FromRow)]
pub struct MonthlyCountEntity {
    /// `YYYY-MM`, in UTC.
    pub month: String,
    pub count: i64,
}

/// Database enum for chat message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "chat_sender", rename_all = "lowercase")]
pub enum ChatSenderDb {
    User,
    Ai,
}

impl From<ChatSenderDb> for Sender {
    fn from(sender: ChatSenderDb) -> Self {
        match sender {
            ChatSenderDb::User => Sender::User,
            ChatSenderDb::Ai => Sender::Ai,
        }
    }
}

impl From<Sender> for ChatSenderDb {
    fn from(sender: Sender) -> Self {
        match sender {
            Sender::User => ChatSenderDb::User,
            Sender::Ai => ChatSenderDb::Ai,
        }
    }
}

/// Database row mapping for the chat_sessions table.
#[derive(Debug, Clone, FromRow)]
pub struct ChatSessionEntity {
    pub id: Uuid,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
}

impl From<ChatSessionEntity> for ChatSession {
    fn from(entity: ChatSessionEntity) -> Self {
        Self {
            id: entity.id,
            user_email: entity.user_email,
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the chat_messages table.
#[derive(Debug, Clone, FromRow)]
pub struct ChatMessageEntity {
    pub id: Uuid,
    pub session_id: Uuid,
    pub sender: ChatSenderDb,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<ChatMessageEntity> for ChatMessage {
    fn from(entity: ChatMessageEntity) -> Self {
        Self {
            id: entity.id,
            session_id: entity.session_id,
            sender: entity.sender.into(),
            message: entity.message,
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the assessments table.
#[derive(Debug, Clone, FromRow)]
pub struct AssessmentEntity {
    pub id: Uuid,
    pub user_email: String,
    pub phq9_score: i32,
    pub gad7_score: i32,
    pub created_at: DateTime<Utc>,
}

impl From<AssessmentEntity> for Assessment {
    fn from(entity: AssessmentEntity) -> Self {
        Self {
            id: entity.id,
            user_email: entity.user_email,
            phq9_score: entity.phq9_score,
            gad7_score: entity.gad7_score,
            created_at: entity.created_at,
        }
    }
}
