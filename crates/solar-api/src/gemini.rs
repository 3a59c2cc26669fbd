use crate::config::GeminiSettings;
use base64::{engine::general_purpose, Engine as _};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use solar_core::{ImageInput, VisionError, VisionModel};
use tracing::{debug, info};

/// Gemini `generateContent` client.
///
/// Uses the blocking reqwest client, so it must be built and called off the
/// async runtime (inside `spawn_blocking`).
pub struct GeminiModel {
    client: Client,
    settings: GeminiSettings,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiModel {
    pub fn new(settings: GeminiSettings) -> Result<Self, VisionError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| VisionError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, settings })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.api_url, self.settings.model
        )
    }
}

impl VisionModel for GeminiModel {
    fn describe_image(&self, image: &ImageInput, prompt: &str) -> Result<String, VisionError> {
        let body = json!({
            "contents": [{
                "parts": [
                    { "text": prompt },
                    {
                        "inline_data": {
                            "mime_type": image.format.mime_type(),
                            "data": general_purpose::STANDARD.encode(&image.bytes),
                        }
                    }
                ]
            }]
        });

        info!(
            "Sending {} byte image to Gemini (model: {})",
            image.bytes.len(),
            self.settings.model
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    VisionError::Timeout
                } else {
                    VisionError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(classify_status(status, message));
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| VisionError::Malformed(e.to_string()))?;
        let text = response_text(parsed)?;
        debug!("Gemini replied with {} characters", text.len());
        Ok(text)
    }
}

/// Overload responses are retryable; everything else is terminal.
fn classify_status(status: StatusCode, message: String) -> VisionError {
    match status {
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::TOO_MANY_REQUESTS => {
            VisionError::Overloaded(format!("{} {}", status.as_u16(), message))
        }
        StatusCode::GATEWAY_TIMEOUT | StatusCode::REQUEST_TIMEOUT => VisionError::Timeout,
        _ => VisionError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

fn response_text(response: GenerateResponse) -> Result<String, VisionError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(VisionError::Malformed(
            "Gemini response contained no text".to_string(),
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overload_statuses_are_retryable() {
        assert!(matches!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE, "busy".into()),
            VisionError::Overloaded(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            VisionError::Overloaded(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, "bad".into()),
            VisionError::Api { status: 400, .. }
        ));
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "yes" }, { "text": "." }] } }]
        }))
        .unwrap();

        assert_eq!(response_text(response).unwrap(), "yes.");
    }

    #[test]
    fn test_empty_response_is_malformed() {
        let response: GenerateResponse =
            serde_json::from_value(json!({ "candidates": [] })).unwrap();

        assert!(matches!(
            response_text(response),
            Err(VisionError::Malformed(_))
        ));
    }
}
