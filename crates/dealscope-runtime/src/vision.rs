//! Vision-based logo extraction.
//!
//! Sends the document image as a base64 data URL to an
//! OpenAI-compatible vision endpoint and parses the logo list out of
//! the reply. Logo text is a nice-to-have: any upstream failure
//! degrades to an empty extraction with a warning, never an error the
//! caller has to handle.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::warn;

use crate::providers::ApiCredential;
use crate::reply::extract_json;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4.1-mini";

const LOGO_PROMPT: &str = r#"Extract text from logos in this document.
IMPORTANT: Consider all text within a single logo/brand element as ONE logo.
If multiple words appear together as part of the same brand/logo, group them
together as a single logo entry.

Return the result as JSON with this structure:
{
    "logos": [
        {
            "logo_name": "combined brand name",
            "extracted_text": "all text from the single logo",
            "location": "where on the document"
        }
    ],
    "total_logos_found": 1,
    "confidence_score": 0.85
}
If no logos found, return empty logos array."#;

/// One detected logo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedLogo {
    #[serde(default)]
    pub logo_name: String,

    #[serde(default)]
    pub extracted_text: String,

    #[serde(default)]
    pub location: Option<String>,
}

/// The full extraction result. Empty on any upstream failure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LogoExtraction {
    #[serde(default)]
    pub logos: Vec<DetectedLogo>,

    #[serde(default)]
    pub confidence_score: Option<f64>,
}

pub struct VisionExtractor {
    client: reqwest::Client,
    credential: ApiCredential,
    api_url: String,
    model: String,
    timeout: Duration,
}

impl VisionExtractor {
    pub fn new(credential: ApiCredential) -> Self {
        Self {
            client: reqwest::Client::new(),
            credential,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Extract logo text from an image or PDF.
    ///
    /// Never fails: network errors, non-200 statuses, and unparseable
    /// replies all degrade to an empty [`LogoExtraction`].
    pub async fn extract(&self, content: &[u8], content_type: &str) -> LogoExtraction {
        let media_type = normalize_media_type(content_type);
        let encoded = base64::engine::general_purpose::STANDARD.encode(content);
        let data_url = format!("data:{media_type};base64,{encoded}");

        let payload = json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "image_url", "image_url": {"url": data_url, "detail": "high"}},
                    {"type": "text", "text": LOGO_PROMPT}
                ]
            }],
            "max_tokens": 1024
        });

        let response = match self
            .client
            .post(&self.api_url)
            .bearer_auth(self.credential.expose())
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(%err, "vision request failed, returning empty extraction");
                return LogoExtraction::default();
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "vision API error, returning empty extraction");
            return LogoExtraction::default();
        }

        let body: serde_json::Value = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                warn!(%err, "vision response was not JSON, returning empty extraction");
                return LogoExtraction::default();
            }
        };

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default();
        parse_extraction(content)
    }
}

/// Parse the model's reply, unwrapping markdown fences if present.
fn parse_extraction(content: &str) -> LogoExtraction {
    let json_text = match extract_json(content) {
        Some(text) => text,
        None => {
            warn!("no JSON object in vision reply, returning empty extraction");
            return LogoExtraction::default();
        }
    };
    match serde_json::from_str(json_text) {
        Ok(extraction) => extraction,
        Err(err) => {
            warn!(%err, "vision reply did not match the logo shape, returning empty extraction");
            LogoExtraction::default()
        }
    }
}

fn normalize_media_type(content_type: &str) -> &str {
    if content_type.starts_with("image") {
        content_type
    } else if content_type.to_lowercase().contains("pdf") {
        "application/pdf"
    } else {
        "image/jpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_normalization() {
        assert_eq!(normalize_media_type("image/png"), "image/png");
        assert_eq!(normalize_media_type("application/PDF"), "application/pdf");
        assert_eq!(normalize_media_type("text/plain"), "image/jpeg");
    }

    #[test]
    fn test_parse_plain_reply() {
        let content = r#"{"logos": [{"logo_name": "Shottenkirk Kia", "extracted_text": "Shottenkirk Kia Katy", "location": "top left"}], "total_logos_found": 1, "confidence_score": 0.91}"#;
        let extraction = parse_extraction(content);
        assert_eq!(extraction.logos.len(), 1);
        assert_eq!(extraction.logos[0].logo_name, "Shottenkirk Kia");
        assert_eq!(extraction.confidence_score, Some(0.91));
    }

    #[test]
    fn test_parse_markdown_wrapped_reply() {
        let content = "```json\n{\"logos\": [], \"total_logos_found\": 0}\n```";
        let extraction = parse_extraction(content);
        assert!(extraction.logos.is_empty());
    }

    #[test]
    fn test_unparseable_reply_degrades_to_empty() {
        assert_eq!(parse_extraction("sorry, no can do"), LogoExtraction::default());
        assert_eq!(parse_extraction(""), LogoExtraction::default());
    }
}
