use async_trait::async_trait;

use crate::domain::ticket::Attachment;
use crate::error::AppResult;

/// One structured-output generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub system_instruction: &'a str,
    pub user_prompt: &'a str,
    pub images: &'a [Attachment],
}

#[async_trait]
pub trait LanguageModelService: Send + Sync {
    /// Label reported alongside generated scenarios.
    fn provider(&self) -> &str;

    /// Returns the raw JSON text produced by the model.
    async fn generate(&self, request: &GenerationRequest<'_>) -> AppResult<String>;
}
