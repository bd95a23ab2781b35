//! Text generation collaborator.
//!
//! Chat replies, meditation scripts and mood insights come from an external
//! text generator. A failing or disabled generator never fails the request:
//! callers fall back to static text.

use crate::models::mood::MoodLog;

/// System prompt for chat replies.
pub const CHAT_SYSTEM_PROMPT: &str =
    "You are a supportive AI therapist offering calm and empathetic advice.";

/// System prompt for mood insights.
pub const INSIGHTS_SYSTEM_PROMPT: &str =
    "You are an empathetic wellness analyst summarizing mood data.";

/// System prompt for wellness reports.
pub const REPORT_SYSTEM_PROMPT: &str = "You are a friendly mental health assistant.";

/// Reply used when the generator is unavailable.
pub const FALLBACK_CHAT_REPLY: &str =
    "I'm here for you. Take a slow breath, and tell me a little more about how you are feeling.";

/// Calming tip attached to every chat reply.
pub const CALMING_TIP: &str = "Remember to take deep breaths and be kind to yourself.";

/// Emotion label attached to chat replies.
pub const DEFAULT_EMOTION: &str = "neutral";

/// A single generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system: Option<String>,
    pub prompt: String,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("Text generation is disabled")]
    Disabled,

    #[error("Text generation failed: {0}")]
    Upstream(String),

    #[error("Text generation returned no content")]
    Empty,
}

/// Produces text for a prompt.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}

/// Generates text, substituting `fallback` on any failure.
pub async fn generate_or_fallback(
    generator: &dyn TextGenerator,
    request: GenerationRequest,
    fallback: impl FnOnce() -> String,
) -> String {
    match generator.generate(request).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            tracing::warn!("Text generator returned empty content, using fallback");
            fallback()
        }
        Err(GenerationError::Disabled) => fallback(),
        Err(e) => {
            tracing::warn!(error = %e, "Text generation failed, using fallback");
            fallback()
        }
    }
}

/// Generator used when no provider is configured.
#[derive(Debug, Clone, Default)]
pub struct DisabledTextGenerator;

#[async_trait::async_trait]
impl TextGenerator for DisabledTextGenerator {
    async fn generate(&self, _request: GenerationRequest) -> Result<String, GenerationError> {
        Err(GenerationError::Disabled)
    }
}

/// Mock generator for development and testing.
#[derive(Debug, Clone, Default)]
pub struct MockTextGenerator {
    /// Fixed reply; when `None` the prompt is echoed back.
    pub reply: Option<String>,
    /// Whether to simulate upstream failures.
    pub simulate_failure: bool,
}

impl MockTextGenerator {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            simulate_failure: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            simulate_failure: true,
        }
    }
}

#[async_trait::async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        if self.simulate_failure {
            return Err(GenerationError::Upstream("Simulated failure".to_string()));
        }
        Ok(self
            .reply
            .clone()
            .unwrap_or_else(|| format!("echo: {}", request.prompt)))
    }
}

/// Builds the request for a chat reply.
pub fn chat_request(message: &str) -> GenerationRequest {
    GenerationRequest::new(message).with_system(CHAT_SYSTEM_PROMPT)
}

/// Builds the request for a guided meditation script.
pub fn meditation_request(kind: &str) -> GenerationRequest {
    GenerationRequest::new(format!("Create a short guided meditation for {}.", kind))
}

/// Static meditation script used when generation is unavailable.
pub fn fallback_meditation(kind: &str) -> String {
    format!(
        "Find a comfortable position and gently close your eyes. This is a short meditation for {}. \
         Breathe in slowly through your nose for a count of four, hold for a moment, and breathe \
         out through your mouth for a count of six. With each breath out, let your shoulders soften. \
         Notice the places where your body touches the ground. When thoughts arrive, let them pass \
         like clouds and return to your breath. Stay here for a few more breaths, then open your \
         eyes when you are ready.",
        kind
    )
}

/// Builds the request for mood insights over `moods` (oldest first).
pub fn insights_request(moods: &[MoodLog]) -> GenerationRequest {
    let summary: Vec<String> = moods
        .iter()
        .map(|m| format!("{}: {} ({})", m.created_at.to_rfc3339(), m.mood, m.intensity))
        .collect();

    let prompt = format!(
        "Analyze this user's recent mood log patterns.\n\
         Provide:\n\
         1. Average emotional tone\n\
         2. 2-3 insights about trends\n\
         3. A motivational statement\n\
         === Mood Data ===\n{}",
        summary.join("\n")
    );

    GenerationRequest::new(prompt).with_system(INSIGHTS_SYSTEM_PROMPT)
}

/// Summary of mood entries computed locally, used when generation is unavailable.
pub fn fallback_insights(moods: &[MoodLog]) -> String {
    if moods.is_empty() {
        return "No mood data found.".to_string();
    }

    let total: i64 = moods.iter().map(|m| i64::from(m.intensity)).sum();
    let average = total as f64 / moods.len() as f64;

    let mut counts: Vec<(&str, usize)> = Vec::new();
    for mood in moods {
        match counts.iter_mut().find(|(name, _)| *name == mood.mood) {
            Some((_, n)) => *n += 1,
            None => counts.push((mood.mood.as_str(), 1)),
        }
    }
    // Stable sort keeps first-seen order among ties.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    let (top_mood, top_count) = counts[0];

    format!(
        "You logged {} moods with an average intensity of {:.1}. \
         Your most frequent mood was \"{}\" ({} times). \
         Every entry is a step toward understanding yourself better. Keep going.",
        moods.len(),
        average,
        top_mood,
        top_count
    )
}

/// Builds the request for a wellness report over recent moods (newest
/// first) and chat messages.
pub fn report_request(moods: &[MoodLog], messages: &[String]) -> GenerationRequest {
    let mood_lines: Vec<String> = moods
        .iter()
        .map(|m| {
            format!(
                "{} (Intensity: {}) on {}",
                m.mood,
                m.intensity,
                m.created_at.to_rfc3339()
            )
        })
        .collect();

    let prompt = format!(
        "Analyze the following therapy chat messages and mood logs.\n\
         Write a concise wellness summary under 200 words.\n\
         === Mood Logs ===\n{}\n\
         === Chat Messages ===\n{}",
        mood_lines.join("\n"),
        messages.join("\n")
    );

    GenerationRequest::new(prompt).with_system(REPORT_SYSTEM_PROMPT)
}

/// Report summary computed locally, used when generation is unavailable.
pub fn fallback_report(moods: &[MoodLog], messages: &[String]) -> String {
    let activity = format!(
        "Over your recent activity you logged {} moods and exchanged {} chat messages.",
        moods.len(),
        messages.len()
    );

    if moods.is_empty() {
        return format!(
            "{} Logging how you feel each day will make these reports more personal.",
            activity
        );
    }

    format!("{} {}", activity, fallback_insights(moods))
}
