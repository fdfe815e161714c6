use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::{Client, header::CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::config::{LlmProvider, LlmSettings};
use crate::error::{AppError, AppResult};
use crate::infra::http::{HttpExecutor, RetryPolicy};
use crate::services::{GenerationRequest, LanguageModelService};

const AI_STUDIO_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const TEMPERATURE: f64 = 0.2;

/// Gemini `generateContent` client for either Google AI Studio (API key) or
/// Vertex AI (project, region and bearer token).
pub struct GeminiClient {
    http: HttpExecutor,
    settings: LlmSettings,
    base_url: Option<String>,
}

impl GeminiClient {
    pub fn new(settings: LlmSettings, policy: RetryPolicy) -> AppResult<Self> {
        Ok(Self {
            http: HttpExecutor::new("Gemini", policy)?,
            settings,
            base_url: None,
        })
    }

    /// Points the client at another host; the path layout stays the same.
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn endpoint(&self) -> AppResult<(String, (&'static str, String))> {
        let model = &self.settings.model;
        match &self.settings.provider {
            LlmProvider::GoogleAiStudio { api_key } => {
                let base = self.base_url.as_deref().unwrap_or(AI_STUDIO_BASE_URL);
                Ok((
                    format!("{}/models/{model}:generateContent", base.trim_end_matches('/')),
                    ("x-goog-api-key", api_key.clone()),
                ))
            }
            LlmProvider::VertexAi {
                project,
                region,
                access_token,
            } => {
                let token = access_token.as_deref().ok_or_else(|| {
                    AppError::Configuration(
                        "GOOGLE_CLOUD_ACCESS_TOKEN is required for Vertex AI".to_string(),
                    )
                })?;
                let base = self
                    .base_url
                    .clone()
                    .unwrap_or_else(|| format!("https://{region}-aiplatform.googleapis.com/v1"));
                Ok((
                    format!(
                        "{}/projects/{project}/locations/{region}/publishers/google/models/{model}:generateContent",
                        base.trim_end_matches('/')
                    ),
                    ("authorization", format!("Bearer {token}")),
                ))
            }
            LlmProvider::Unconfigured => Err(AppError::Configuration(
                "no language model credentials configured".to_string(),
            )),
        }
    }

    fn request_body(request: &GenerationRequest<'_>) -> Value {
        let mut parts = vec![json!({ "text": request.user_prompt })];
        parts.extend(request.images.iter().map(|image| {
            json!({
                "inlineData": {
                    "mimeType": image.mime_type,
                    "data": BASE64_STANDARD.encode(&image.bytes),
                }
            })
        }));

        json!({
            "systemInstruction": { "parts": [{ "text": request.system_instruction }] },
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "responseMimeType": "application/json",
            }
        })
    }
}

#[async_trait]
impl LanguageModelService for GeminiClient {
    fn provider(&self) -> &str {
        self.settings.provider.label()
    }

    async fn generate(&self, request: &GenerationRequest<'_>) -> AppResult<String> {
        let (url, (auth_name, auth_value)) = self.endpoint()?;
        let body = Self::request_body(request);
        debug!(
            provider = self.provider(),
            images = request.images.len(),
            prompt_chars = request.user_prompt.len(),
            "calling language model"
        );

        let response: GenerateContentResponse = self
            .http
            .send_json(|http: &Client| {
                http.post(&url)
                    .header(auth_name, &auth_value)
                    .header(CONTENT_TYPE, "application/json")
                    .json(&body)
            })
            .await?;

        let text = response
            .candidates
            .into_iter()
            .flat_map(|candidate| candidate.content.map(|c| c.parts).unwrap_or_default())
            .filter_map(|part| part.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(AppError::LanguageModel(
                "model returned no text content".to_string(),
            ));
        }
        Ok(text)
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}
