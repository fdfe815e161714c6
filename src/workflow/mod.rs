pub mod clickup;
pub mod generate;
pub mod jira;
pub mod outcome;
pub mod report;

/// Short id tying together the log lines of one run.
pub(crate) fn run_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}
