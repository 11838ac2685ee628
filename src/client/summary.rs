//! Conversation summaries

use super::api::ChatService;
use super::i18n::{SUMMARY_ERROR, SUMMARY_UNAVAILABLE};
use super::models::{Language, Message, Sender};
use crate::error::BankchatError;
use crate::types::SummaryRequest;

/// Transcript length sent for summarization, in characters
pub const MAX_TRANSCRIPT_CHARS: usize = 4000;

/// Appended when the transcript is cut
pub const TRUNCATION_MARKER: &str = "...[conversation truncated]";

/// Render messages as `User: ...` / `Assistant: ...` blocks
///
/// # Examples
///
/// ```
/// use bankchat::client::models::Message;
/// use bankchat::client::summary::build_transcript;
///
/// let transcript = build_transcript(&[Message::user("Hi"), Message::ai("Hello")]);
/// assert_eq!(transcript, "User: Hi\n\nAssistant: Hello");
/// ```
pub fn build_transcript(messages: &[Message]) -> String {
    let transcript = messages
        .iter()
        .map(|m| match m.sender {
            Sender::User => format!("User: {}", m.text),
            Sender::Ai => format!("Assistant: {}", m.text),
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    truncate_transcript(transcript)
}

fn truncate_transcript(transcript: String) -> String {
    if transcript.chars().count() <= MAX_TRANSCRIPT_CHARS {
        return transcript;
    }
    let head: String = transcript.chars().take(MAX_TRANSCRIPT_CHARS).collect();
    format!("{}{}", head, TRUNCATION_MARKER)
}

/// State of the summary panel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryPanel {
    pub visible: bool,
    pub loading: bool,
    pub text: String,
}

impl SummaryPanel {
    pub fn close(&mut self) {
        *self = Self::default();
    }
}

/// Ask the service for a summary
///
/// Never fails: a non-success response yields the "unavailable" text and a
/// transport failure the "error" text. Returns `None` for an empty
/// conversation, in which case no request is made.
pub async fn summarize(
    api: &dyn ChatService,
    token: &str,
    messages: &[Message],
    language: Language,
) -> Option<String> {
    if messages.is_empty() {
        return None;
    }

    let request = SummaryRequest {
        conversation_history: build_transcript(messages),
        language,
    };

    let text = match api.summarize(token, &request).await {
        Ok(response) if !response.summary.trim().is_empty() => response.summary,
        Ok(_) => SUMMARY_UNAVAILABLE.to_string(),
        Err(e) => {
            tracing::error!("Error generating summary: {}", e);
            match e.downcast_ref::<BankchatError>() {
                Some(BankchatError::Api { .. }) | Some(BankchatError::Unauthorized(_)) => {
                    SUMMARY_UNAVAILABLE.to_string()
                }
                _ => SUMMARY_ERROR.to_string(),
            }
        }
    };
    Some(text)
}
