pub mod issue_tracker;
pub mod language_model;

pub use issue_tracker::{IssueTrackerService, TaskDirectory, TestCaseRepository};
pub use language_model::{GenerationRequest, LanguageModelService};
