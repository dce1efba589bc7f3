//! Decoding of Claude CLI `--output-format stream-json` output.
//!
//! The CLI prints one JSON object per line while it works: a `system` init
//! record, `assistant` messages (text and tool calls), `user` tool results and
//! a closing `result` record. Diagnostic lines that are not JSON can be mixed
//! in, and the stream may be cut short if the process dies, so decoding is
//! per line and anything unrecognised is skipped.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// Returned when the stream holds no usable answer.
pub const FALLBACK_TEXT: &str = "General fixes and updates";

/// Stop reason marking an assistant message as the end of its turn.
const END_TURN: &str = "end_turn";

/// One decoded line of the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    SystemInit { session_id: Option<String> },
    AssistantMessage(AssistantMessage),
    UserToolResult,
    FinalResult(FinalResult),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        #[serde(default)]
        text: Option<String>,
    },
    ToolUse {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FinalResult {
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub is_error: Option<bool>,
    /// Answer text on success. Kept as raw JSON so a non-string value is
    /// ignored rather than making the whole record undecodable.
    #[serde(default)]
    pub result: Option<Value>,
}

impl FinalResult {
    /// The answer text, if this is a successful result carrying a string.
    pub fn success_text(&self) -> Option<&str> {
        if self.subtype.as_deref() != Some("success") {
            return None;
        }
        self.result.as_ref().and_then(Value::as_str)
    }
}

impl AssistantMessage {
    /// Joined text blocks, if this message ends the assistant's turn.
    pub fn final_text(&self) -> Option<String> {
        if self.stop_reason.as_deref() != Some(END_TURN) {
            return None;
        }
        if self.role.as_deref().is_some_and(|role| role != "assistant") {
            return None;
        }

        let texts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => text.as_deref(),
                _ => None,
            })
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.join("\n"))
        }
    }
}

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
struct MessageEnvelope<T> {
    message: T,
}

#[derive(Deserialize)]
struct SystemEnvelope {
    #[serde(default)]
    session_id: Option<String>,
}

impl StreamEvent {
    /// Decode one stream line. Returns `None` for anything that is not a
    /// recognised event.
    pub fn from_line(line: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(line).ok()?;
        Self::from_value(value)
    }

    fn from_value(value: Value) -> Option<Self> {
        // Older CLI builds tagged records with `role` instead of `type`.
        let kind = value
            .get("type")
            .or_else(|| value.get("role"))
            .and_then(Value::as_str)?
            .to_string();

        match kind.as_str() {
            "system" => serde_json::from_value::<SystemEnvelope>(value)
                .ok()
                .map(|s| StreamEvent::SystemInit {
                    session_id: s.session_id,
                }),
            "assistant" => serde_json::from_value::<MessageEnvelope<AssistantMessage>>(value)
                .ok()
                .map(|envelope| StreamEvent::AssistantMessage(envelope.message)),
            "user" => Some(StreamEvent::UserToolResult),
            "result" => serde_json::from_value::<FinalResult>(value)
                .ok()
                .map(StreamEvent::FinalResult),
            _ => None,
        }
    }
}

/// Where the final answer was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    /// A successful `result` record at this event index.
    FinalResult { index: usize },
    /// An `end_turn` assistant message at this event index.
    AssistantMessage { index: usize },
    /// Nothing usable; the fallback text was used.
    Fallback,
}

/// Final answer recovered from a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalAnswer {
    pub text: String,
    pub source: AnswerSource,
}

/// Decode every recognisable event in `raw`, in order.
pub fn decode_stream(raw: &str) -> Vec<StreamEvent> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(StreamEvent::from_line)
        .collect()
}

/// Recover the final answer from a raw stream.
///
/// Walks events from last to first. A successful `result` record is
/// authoritative; an `end_turn` assistant message with text is accepted only
/// when no later event matched first. Falls back to [`FALLBACK_TEXT`].
pub fn extract_final_answer(raw: &str) -> FinalAnswer {
    let events = decode_stream(raw);
    debug!("Decoded {} stream events", events.len());

    for (index, event) in events.iter().enumerate().rev() {
        let found = match event {
            StreamEvent::FinalResult(result) => result
                .success_text()
                .map(|text| (text.to_string(), AnswerSource::FinalResult { index })),
            StreamEvent::AssistantMessage(message) => message
                .final_text()
                .map(|text| (text, AnswerSource::AssistantMessage { index })),
            StreamEvent::SystemInit { .. } | StreamEvent::UserToolResult => None,
        };

        if let Some((text, source)) = found {
            if text.is_empty() {
                break;
            }
            return FinalAnswer { text, source };
        }
    }

    FinalAnswer {
        text: FALLBACK_TEXT.to_string(),
        source: AnswerSource::Fallback,
    }
}

/// Recover the final answer text from a raw stream. Never fails.
pub fn extract_final_text(raw: &str) -> String {
    extract_final_answer(raw).text
}
