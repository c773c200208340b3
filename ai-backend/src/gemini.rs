//! Thin client for the Gemini `generateContent` REST endpoint.
//!
//! One `GeminiClient` is built at startup and shared by every request; it
//! holds nothing mutable. Each call races the generation request against a
//! wall-clock timer and inspects the candidate's finish reason before
//! handing raw text back to the parsing pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const FALLBACK_GEMINI_MODEL: &str = "gemini-2.0-flash";

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: String,
    pub primary_model: String,
    pub fallback_model: String,
}

impl GeminiConfig {
    /// Reads `GEMINI_API_KEY`, `GEMINI_MODEL` and `GEMINI_FALLBACK_MODEL`.
    /// A missing key is fatal. Leaving the fallback equal to the primary
    /// disables the fallback tier.
    pub fn from_env() -> Result<GeminiConfig, AnalysisError> {
        let api_key =
            std::env::var("GEMINI_API_KEY").map_err(|_| AnalysisError::ConfigurationMissing)?;
        let primary_model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());
        let fallback_model = std::env::var("GEMINI_FALLBACK_MODEL")
            .unwrap_or_else(|_| FALLBACK_GEMINI_MODEL.to_string());
        Ok(GeminiConfig {
            api_key,
            primary_model,
            fallback_model,
        })
    }

    pub fn has_distinct_fallback(&self) -> bool {
        self.fallback_model != self.primary_model
    }
}

/// Per-attempt generation knobs. The prompt never changes between
/// attempts; only these do.
#[derive(Clone, Debug)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub response_schema: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "systemInstruction")]
    system_instruction: Content<'a>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> GeminiClient {
        GeminiClient {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// One generation call against `model`, bounded by `timeout`.
    ///
    /// Returns the candidate's raw text. A finish reason of `MAX_TOKENS`
    /// becomes `TruncatedOutput` even though text exists, so the caller
    /// can decide whether a bigger budget is worth another call. Other
    /// abnormal finish reasons are logged and fall through to parsing,
    /// since partial-but-parseable output is still usable.
    pub async fn generate(
        &self,
        model: &str,
        system_instruction: &str,
        user_text: &str,
        params: &GenerationParams,
        timeout: Duration,
    ) -> Result<String, AnalysisError> {
        let url = format!(
            "{GEMINI_BASE_URL}/{model}:generateContent?key={key}",
            key = self.config.api_key
        );

        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: user_text }],
            }],
            system_instruction: Content {
                role: "model",
                parts: vec![RequestPart {
                    text: system_instruction,
                }],
            },
            generation_config: GenerationConfig {
                temperature: params.temperature,
                response_mime_type: "application/json",
                response_schema: params.response_schema.clone(),
                max_output_tokens: params.max_output_tokens,
            },
        };

        let send = async {
            let response = self
                .http
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| AnalysisError::UpstreamRejected(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let detail = response.text().await.unwrap_or_default();
                log::error!("[gemini] {model} returned {status}: {detail}");
                return Err(AnalysisError::UpstreamRejected(format!(
                    "{model} returned {status}"
                )));
            }

            response
                .json::<GenerateResponse>()
                .await
                .map_err(|e| AnalysisError::UpstreamRejected(e.to_string()))
        };

        // The race. Dropping the send future on timeout cancels the
        // in-flight request; the upstream API has no server-side abort.
        let response = match tokio::time::timeout(timeout, send).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(AnalysisError::Timeout {
                    model: model.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
        };

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AnalysisError::UpstreamRejected(format!("{model} returned no candidates")))?;

        match candidate.finish_reason.as_deref() {
            None | Some("STOP") => {}
            Some("MAX_TOKENS") => {
                return Err(AnalysisError::TruncatedOutput {
                    model: model.to_string(),
                });
            }
            Some(other) => {
                log::warn!("[gemini] {model} finished with reason {other}");
            }
        }

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        Ok(text)
    }
}
