pub mod clickup;
pub mod http;
pub mod jira;
pub mod llm;
