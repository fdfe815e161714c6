use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::context::ContextFormatter;
use crate::services::{IssueTrackerService, LanguageModelService, TaskDirectory, TestCaseRepository};

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub jira: Arc<dyn TestCaseRepository>,
    pub clickup: Arc<dyn IssueTrackerService>,
    pub clickup_directory: Arc<dyn TaskDirectory>,
    pub language_model: Arc<dyn LanguageModelService>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        jira: Arc<dyn TestCaseRepository>,
        clickup: Arc<dyn IssueTrackerService>,
        clickup_directory: Arc<dyn TaskDirectory>,
        language_model: Arc<dyn LanguageModelService>,
    ) -> Self {
        Self {
            config,
            jira,
            clickup,
            clickup_directory,
            language_model,
        }
    }

    pub fn context_formatter(&self) -> ContextFormatter {
        ContextFormatter::new(self.config.context_limits)
    }
}
