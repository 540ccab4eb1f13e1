//! Capability contracts for the Cthulhu-News story engine.
//!
//! This crate defines the narrow seams the engine talks through:
//! - `TextGenerator`: a model that answers a prompt with a JSON object
//! - `ImageGenerator`: a model that renders an illustration for a prompt
//!
//! Implementations live out of tree; the engine only depends on these
//! traits and on `extract_json` for responses that arrive wrapped in
//! markdown fences.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from a generation capability.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The provider could not be reached or returned a transport-level failure.
    #[error("generation transport error: {0}")]
    Transport(String),

    /// The provider answered, but not with parseable JSON.
    #[error("generation response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The provider answered with an empty body.
    #[error("generation response is empty")]
    Empty,
}

/// A model capable of answering a prompt with a JSON object.
///
/// The contract mirrors a chat completion with an enforced JSON response
/// format: one system role string, one user prompt, a model id and a token
/// budget. Transport and parse failures are fatal to the caller; the engine
/// performs no retries of its own.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Request a JSON object for the given role and prompt.
    async fn generate_json(
        &self,
        system_role: &str,
        user_prompt: &str,
        model: &str,
        max_tokens: usize,
    ) -> Result<serde_json::Value, GenerationError>;
}

/// An illustration produced by an image model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Raw image bytes (PNG).
    pub bytes: Vec<u8>,

    /// The prompt as rewritten by the provider, when reported.
    pub revised_prompt: Option<String>,
}

/// A model capable of rendering an illustration for a prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Render an image for the given prompt.
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, GenerationError>;
}

/// Parse a generation response that may be wrapped in markdown code fences.
pub fn parse_json_response(text: &str) -> Result<serde_json::Value, GenerationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::Empty);
    }
    Ok(serde_json::from_str(extract_json(trimmed))?)
}

/// Extract the JSON payload from a response that might use ``` fences.
pub fn extract_json(text: &str) -> &str {
    let text = text.trim();

    for opener in ["```json", "```"] {
        if let Some(start) = text.find(opener) {
            let body_start = start + opener.len();
            if let Some(end) = text[body_start..].find("```") {
                return text[body_start..body_start + end].trim();
            }
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_plain() {
        let text = r#"{"scene_title": "The Tide"}"#;
        assert_eq!(extract_json(text), text);
    }

    #[test]
    fn test_extract_json_fenced() {
        let text = "```json\n{\"scene_title\": \"The Tide\"}\n```";
        assert_eq!(extract_json(text), r#"{"scene_title": "The Tide"}"#);
    }

    #[test]
    fn test_extract_json_fenced_no_language() {
        let text = "```\n{\"ok\": true}\n```";
        assert_eq!(extract_json(text), r#"{"ok": true}"#);
    }

    #[test]
    fn test_parse_json_response_empty() {
        assert!(matches!(
            parse_json_response("   "),
            Err(GenerationError::Empty)
        ));
    }

    #[test]
    fn test_parse_json_response_fenced() {
        let value = parse_json_response("```json\n{\"n\": 3}\n```").unwrap();
        assert_eq!(value["n"], 3);
    }
}
