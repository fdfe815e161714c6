use std::env;

use tracing::warn;

use crate::domain::context::ContextLimits;

const DEFAULT_CLICKUP_API_BASE: &str = "https://api.clickup.com/api/v2";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_VERTEX_REGION: &str = "us-central1";
const DEFAULT_MAX_TESTS: usize = 20;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jira: JiraSettings,
    pub clickup: ClickUpSettings,
    pub llm: LlmSettings,
    pub context_limits: ContextLimits,
    pub max_tests: usize,
}

#[derive(Debug, Clone)]
pub struct JiraSettings {
    pub base_url: Option<String>,
    pub email: Option<String>,
    pub token: Option<String>,
    pub default_project: Option<String>,
    pub test_issue_type: String,
    pub test_link_type: String,
    pub relates_link_type: String,
}

#[derive(Debug, Clone)]
pub struct ClickUpSettings {
    pub api_key: Option<String>,
    pub api_base: String,
    pub default_list_id: Option<String>,
    pub test_case_type_id: Option<String>,
    /// `(space name, space id)` pairs searched for testing-repository folders.
    pub spaces: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmProvider {
    GoogleAiStudio {
        api_key: String,
    },
    VertexAi {
        project: String,
        region: String,
        access_token: Option<String>,
    },
    Unconfigured,
}

impl LlmProvider {
    pub fn label(&self) -> &'static str {
        match self {
            LlmProvider::GoogleAiStudio { .. } => "google-ai-studio",
            LlmProvider::VertexAi { .. } => "vertex-ai",
            LlmProvider::Unconfigured => "unconfigured",
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let number = |key: &str, default: usize| match get(key) {
            None => default,
            Some(raw) => raw.parse::<usize>().unwrap_or_else(|_| {
                warn!(key, value = %raw, default, "ignoring non-numeric setting");
                default
            }),
        };

        let provider = match (get("GOOGLE_API_KEY"), get("GOOGLE_CLOUD_PROJECT_ID")) {
            (Some(api_key), _) => LlmProvider::GoogleAiStudio { api_key },
            (None, Some(project)) => LlmProvider::VertexAi {
                project,
                region: get("GOOGLE_CLOUD_REGION")
                    .unwrap_or_else(|| DEFAULT_VERTEX_REGION.to_string()),
                access_token: get("GOOGLE_CLOUD_ACCESS_TOKEN"),
            },
            (None, None) => LlmProvider::Unconfigured,
        };

        Self {
            jira: JiraSettings {
                base_url: get("JIRA_BASE"),
                email: get("JIRA_EMAIL"),
                token: get("JIRA_TOKEN"),
                default_project: get("DEFAULT_PROJECT_KEY"),
                test_issue_type: get("JIRA_TEST_ISSUE_TYPE").unwrap_or_else(|| "Test".to_string()),
                test_link_type: get("JIRA_TEST_LINK_TYPE").unwrap_or_else(|| "Tests".to_string()),
                relates_link_type: get("RELATES_LINK_TYPE")
                    .unwrap_or_else(|| "Relates".to_string()),
            },
            clickup: ClickUpSettings {
                api_key: get("CLICKUP_API_KEY"),
                api_base: get("CLICKUP_API_BASE")
                    .unwrap_or_else(|| DEFAULT_CLICKUP_API_BASE.to_string()),
                default_list_id: get("CLICKUP_LIST_ID"),
                test_case_type_id: get("CLICKUP_TEST_CASE_TYPE_ID"),
                spaces: get("CLICKUP_SPACES")
                    .map(|raw| parse_spaces(&raw))
                    .unwrap_or_default(),
            },
            llm: LlmSettings {
                provider,
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            },
            context_limits: ContextLimits {
                max_chars: number("LLM_MAX_CONTEXT_CHARS", ContextLimits::default().max_chars),
                max_comments: number("LLM_MAX_COMMENTS", ContextLimits::default().max_comments),
                max_comment_chars: number(
                    "LLM_MAX_COMMENT_CHARS",
                    ContextLimits::default().max_comment_chars,
                ),
            },
            max_tests: number("MAX_TESTS", DEFAULT_MAX_TESTS),
        }
    }
}

/// Parses `Name=id,Other=id2`; entries without a name or id are skipped.
fn parse_spaces(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|entry| {
            let (name, id) = entry.split_once('=')?;
            let (name, id) = (name.trim(), id.trim());
            if name.is_empty() || id.is_empty() {
                None
            } else {
                Some((name.to_string(), id.to_string()))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| values.get(key).cloned())
    }

    #[test]
    fn applies_defaults() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.jira.base_url, None);
        assert_eq!(cfg.jira.relates_link_type, "Relates");
        assert_eq!(cfg.jira.test_link_type, "Tests");
        assert_eq!(cfg.clickup.api_base, DEFAULT_CLICKUP_API_BASE);
        assert_eq!(cfg.llm.provider, LlmProvider::Unconfigured);
        assert_eq!(cfg.llm.model, "gemini-2.5-flash");
        assert_eq!(cfg.context_limits, ContextLimits::default());
        assert_eq!(cfg.max_tests, 20);
    }

    #[test]
    fn api_key_wins_over_vertex() {
        let cfg = config_from(&[
            ("GOOGLE_API_KEY", "key-123"),
            ("GOOGLE_CLOUD_PROJECT_ID", "proj"),
        ]);
        assert_eq!(
            cfg.llm.provider,
            LlmProvider::GoogleAiStudio {
                api_key: "key-123".to_string()
            }
        );
    }

    #[test]
    fn selects_vertex_with_default_region() {
        let cfg = config_from(&[("GOOGLE_CLOUD_PROJECT_ID", "proj"), ("GOOGLE_API_KEY", "  ")]);
        assert_eq!(
            cfg.llm.provider,
            LlmProvider::VertexAi {
                project: "proj".to_string(),
                region: "us-central1".to_string(),
                access_token: None,
            }
        );
        assert_eq!(cfg.llm.provider.label(), "vertex-ai");
    }

    #[test]
    fn bad_numbers_fall_back() {
        let cfg = config_from(&[("LLM_MAX_COMMENTS", "many"), ("MAX_TESTS", "7")]);
        assert_eq!(cfg.context_limits.max_comments, 10);
        assert_eq!(cfg.max_tests, 7);
    }

    #[test]
    fn parses_space_pairs() {
        let cfg = config_from(&[("CLICKUP_SPACES", "Herald=901, Kupyo = 902,broken,=5")]);
        assert_eq!(
            cfg.clickup.spaces,
            vec![
                ("Herald".to_string(), "901".to_string()),
                ("Kupyo".to_string(), "902".to_string()),
            ]
        );
    }
}
