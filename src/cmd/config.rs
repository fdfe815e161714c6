use clap::{Args, Subcommand};

use crate::config::{AppConfig, LlmProvider};

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Show the effective configuration (secrets masked).
    Show,
}

pub fn run(command: ConfigCommand, config: &AppConfig) {
    match command {
        ConfigCommand::Show => {
            for line in show_lines(config) {
                println!("{line}");
            }
        }
    }
}

fn show_lines(cfg: &AppConfig) -> Vec<String> {
    let mut lines = vec![
        format!("Jira base URL: {}", display_value(&cfg.jira.base_url)),
        format!("Jira email: {}", display_value(&cfg.jira.email)),
        format!("Jira API token: {}", mask_secret(&cfg.jira.token)),
        format!("Default project: {}", display_value(&cfg.jira.default_project)),
        format!("Test issue type: {}", cfg.jira.test_issue_type),
        format!(
            "Link types: {} (fallback {})",
            cfg.jira.test_link_type, cfg.jira.relates_link_type
        ),
        format!("ClickUp API base: {}", cfg.clickup.api_base),
        format!("ClickUp API key: {}", mask_secret(&cfg.clickup.api_key)),
        format!("ClickUp list: {}", display_value(&cfg.clickup.default_list_id)),
        format!(
            "ClickUp test case type: {}",
            display_value(&cfg.clickup.test_case_type_id)
        ),
        format!("ClickUp spaces: {}", display_spaces(&cfg.clickup.spaces)),
        format!("LLM provider: {}", cfg.llm.provider.label()),
        format!("LLM model: {}", cfg.llm.model),
    ];

    match &cfg.llm.provider {
        LlmProvider::GoogleAiStudio { api_key } => {
            lines.push(format!("Google API key: {}", mask_secret(&Some(api_key.clone()))));
        }
        LlmProvider::VertexAi {
            project,
            region,
            access_token,
        } => {
            lines.push(format!("Vertex project: {project} ({region})"));
            lines.push(format!("Vertex access token: {}", mask_secret(access_token)));
        }
        LlmProvider::Unconfigured => {}
    }

    let limits = cfg.context_limits;
    lines.push(format!(
        "Context limits: {} chars, {} comments, {} chars per comment",
        limits.max_chars, limits.max_comments, limits.max_comment_chars
    ));
    lines.push(format!("Max tests: {}", cfg.max_tests));
    lines
}

fn display_spaces(spaces: &[(String, String)]) -> String {
    if spaces.is_empty() {
        return "<not set>".to_string();
    }
    spaces
        .iter()
        .map(|(name, id)| format!("{name}={id}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

fn mask_secret(value: &Option<String>) -> String {
    match value.as_deref() {
        Some(token) if token.chars().count() > 6 => {
            let chars: Vec<char> = token.chars().collect();
            let prefix: String = chars[..3].iter().collect();
            let suffix: String = chars[chars.len() - 3..].iter().collect();
            format!("{prefix}***{suffix}")
        }
        Some(token) if !token.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}
