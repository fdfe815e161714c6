pub mod clickup;
pub mod config;
pub mod destinations;
pub mod jira;
pub mod render;
pub mod report;
