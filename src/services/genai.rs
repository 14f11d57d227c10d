use serde::Serialize;
use serde_json::Value;
use tokio::time::Duration;

use crate::domain::matcher::{GenAiReply, RecommendationPayload};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct GenAiService {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

impl GenAiService {
    pub fn from_env() -> Self {
        let api_base = std::env::var("GEMINI_API_BASE")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string());
        let api_key = std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());
        let model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string());
        Self {
            client: reqwest::Client::new(),
            api_base,
            api_key,
            model,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// One attempt against the generative endpoint; any transport or
    /// shape problem collapses into `Malformed` and the caller serves
    /// the bundled fallback instead. Deliberately no retry loop: the
    /// request path already has a deterministic answer ready.
    pub async fn recommendations(&self, symptoms: &[String]) -> GenAiReply {
        let Some(api_key) = &self.api_key else {
            return GenAiReply::Malformed;
        };

        let prompt = build_prompt(symptoms);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens: 2048,
            },
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base, self.model, api_key
        );

        let response = match self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                tracing::warn!("generative request failed: {err}");
                return GenAiReply::Malformed;
            }
        };

        if !response.status().is_success() {
            tracing::warn!("generative request returned {}", response.status());
            return GenAiReply::Malformed;
        }

        let value: Value = match response.json().await {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!("generative response body unreadable: {err}");
                return GenAiReply::Malformed;
            }
        };

        parse_reply(&value)
    }
}

fn build_prompt(symptoms: &[String]) -> String {
    let joined = symptoms.join(", ");
    format!(
        "You are a wellness assistant for menstrual health. For these symptoms: {joined}, \
         respond with ONLY a JSON object of the form \
         {{\"yogaAsanas\": [{{\"name\", \"duration\", \"steps\", \"benefits\", \
         \"relievesSymptoms\", \"precautions\"}}], \
         \"ayurvedicRemedies\": [{{\"name\", \"category\", \"description\", \"ingredients\", \
         \"steps\", \"benefits\", \"bestTimeToConsume\", \"precautions\"}}]}}. \
         Suggest at most 6 yoga asanas and 4 remedies. No prose outside the JSON."
    )
}

/// Pull the first candidate's text and classify it: parseable into the
/// recommendation shape, plain JSON of the wrong shape, or free text.
fn parse_reply(value: &Value) -> GenAiReply {
    let text = value
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str);

    let Some(text) = text else {
        tracing::warn!("generative response missing candidate text");
        return GenAiReply::Malformed;
    };

    let trimmed = strip_code_fences(text);
    match serde_json::from_str::<Value>(trimmed) {
        Ok(json) => match serde_json::from_value::<RecommendationPayload>(json) {
            Ok(payload) => GenAiReply::Structured(payload),
            Err(err) => {
                tracing::warn!("generative JSON has unexpected shape: {err}");
                GenAiReply::Malformed
            }
        },
        Err(_) => GenAiReply::FreeText(trimmed.to_string()),
    }
}

/// Models often wrap JSON in markdown fences; tolerate that.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(text: &str) -> Value {
        json!({
            "candidates": [
                { "content": { "parts": [ { "text": text } ] } }
            ]
        })
    }

    #[test]
    fn structured_candidate_parses_into_payload() {
        let text = r#"{"yogaAsanas": [{"name": "Child's Pose"}], "ayurvedicRemedies": []}"#;
        match parse_reply(&candidate(text)) {
            GenAiReply::Structured(payload) => {
                assert_eq!(payload.yoga_asanas.len(), 1);
                assert_eq!(payload.yoga_asanas[0].name, "Child's Pose");
            }
            other => panic!("expected structured reply, got {other:?}"),
        }
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let text = "```json\n{\"yogaAsanas\": [], \"ayurvedicRemedies\": []}\n```";
        assert!(matches!(
            parse_reply(&candidate(text)),
            GenAiReply::Structured(_)
        ));
    }

    #[test]
    fn prose_candidate_becomes_free_text() {
        match parse_reply(&candidate("Try some gentle stretching.")) {
            GenAiReply::FreeText(text) => assert!(text.contains("stretching")),
            other => panic!("expected free text, got {other:?}"),
        }
    }

    #[test]
    fn missing_candidates_are_malformed() {
        assert!(matches!(
            parse_reply(&json!({ "candidates": [] })),
            GenAiReply::Malformed
        ));
    }

    #[test]
    fn wrong_shape_json_is_malformed() {
        assert!(matches!(
            parse_reply(&candidate(r#"{"yogaAsanas": "not a list"}"#)),
            GenAiReply::Malformed
        ));
    }
}
