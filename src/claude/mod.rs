//! Claude CLI integration.

pub mod stream;
pub mod subprocess;

pub use stream::{
    AnswerSource, FALLBACK_TEXT, FinalAnswer, StreamEvent, decode_stream, extract_final_answer,
    extract_final_text,
};
pub use subprocess::{
    ClaudeExecutor, CliExecutor, StreamCapture, check_api_key, check_claude_installed,
};
