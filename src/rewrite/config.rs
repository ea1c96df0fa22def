use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the local inference server and for judging its output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Base URL of a llama.cpp compatible server
    pub endpoint: String,

    /// Upper bound on generated tokens (default: 2048)
    pub max_tokens: u32,

    pub temperature: f32,
    pub top_p: f32,
    pub repeat_penalty: f32,

    /// Request timeout in seconds; local generation is slow (default: 600)
    pub timeout_secs: u64,

    /// Posts shorter than this many characters are not sent (default: 50)
    pub min_input_chars: usize,

    /// Responses shorter than this many characters are rejected (default: 300)
    pub min_output_chars: usize,

    /// Responses with fewer periods than this are rejected (default: 5)
    pub min_sentences: usize,

    /// System instructions placed before every post
    pub system_prompt: String,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080".to_string(),
            max_tokens: 2048,
            temperature: 0.82,
            top_p: 0.97,
            repeat_penalty: 1.05,
            timeout_secs: 600,
            min_input_chars: 50,
            min_output_chars: 300,
            min_sentences: 5,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl RewriteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a storyteller retelling an online post as a short narration.
1. Speak in the first person, as if it happened to you.
2. Keep a conversational, casual tone and include emotional asides.
3. Aim for 800 to 1200 characters.
4. Open with a hook that makes the listener want to hear the rest.
5. Write in the same language as the post.";
