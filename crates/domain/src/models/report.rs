//! Wellness progress report models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mood entries the report draws on.
pub const REPORT_MOOD_LIMIT: i64 = 10;

/// Chat messages the report draws on.
pub const REPORT_MESSAGE_LIMIT: i64 = 50;

/// Summary used when the user has neither moods nor chat messages.
pub const NO_ACTIVITY_SUMMARY: &str =
    "No mood logs or chat messages yet. Log a mood or start a chat to build your first report.";

/// Output format of the report endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Text,
}

/// Query string of the report endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub format: ReportFormat,
}

/// A generated wellness summary over a user's recent activity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct WellnessReport {
    pub user_email: String,
    pub generated_at: DateTime<Utc>,
    pub mood_entries: usize,
    pub chat_messages: usize,
    pub summary: String,
}

impl WellnessReport {
    /// Plain-text rendering for download.
    pub fn to_text(&self) -> String {
        format!(
            "Therapy Progress Report\n\
             User: {}\n\
             Generated on: {}\n\
             Based on {} mood entries and {} chat messages\n\
             \n\
             {}\n",
            self.user_email,
            self.generated_at.format("%Y-%m-%d %H:%M UTC"),
            self.mood_entries,
            self.chat_messages,
            self.summary
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_report_format_parses_lowercase() {
        let query: ReportQuery = serde_json::from_str(r#"{"format": "text"}"#).unwrap();
        assert_eq!(query.format, ReportFormat::Text);

        let query: ReportQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.format, ReportFormat::Json);

        assert!(serde_json::from_str::<ReportQuery>(r#"{"format": "pdf"}"#).is_err());
    }

    #[test]
    fn test_text_rendering() {
        let report = WellnessReport {
            user_email: "amani@example.com".to_string(),
            generated_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
            mood_entries: 4,
            chat_messages: 12,
            summary: "You have been sleeping better.".to_string(),
        };

        let text = report.to_text();
        assert!(text.starts_with("Therapy Progress Report\n"));
        assert!(text.contains("User: amani@example.com"));
        assert!(text.contains("Generated on: 2025-03-01 09:30 UTC"));
        assert!(text.contains("4 mood entries and 12 chat messages"));
        assert!(text.ends_with("You have been sleeping better.\n"));
    }
}
