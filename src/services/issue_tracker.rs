use async_trait::async_trait;

use crate::domain::report::TaskEntry;
use crate::domain::ticket::{Destination, ExistingTestTicket, NewTestTicket, SourceTicket, Ticket};
use crate::error::AppResult;

#[async_trait]
pub trait IssueTrackerService: Send + Sync {
    async fn fetch_ticket(&self, id: &str) -> AppResult<SourceTicket>;
    async fn create_test_ticket(&self, request: &NewTestTicket) -> AppResult<Ticket>;
    async fn link(&self, new_key: &str, source_key: &str) -> AppResult<()>;

    /// Places test tickets can be written to; empty when the backend has no
    /// folder or list discovery.
    async fn list_destinations(&self) -> AppResult<Vec<Destination>> {
        Ok(Vec::new())
    }
}

/// Trackers that can find, rewrite and remove the tests created by earlier runs.
#[async_trait]
pub trait TestCaseRepository: IssueTrackerService {
    async fn existing_tests(
        &self,
        source_key: &str,
        destination: &str,
    ) -> AppResult<Vec<ExistingTestTicket>>;
    async fn update_test_ticket(&self, ticket: &ExistingTestTicket, body: &str) -> AppResult<()>;
    async fn delete_ticket(&self, key: &str) -> AppResult<()>;
}

/// Folder and list browsing used to report on stored test cases.
#[async_trait]
pub trait TaskDirectory: Send + Sync {
    /// `(list id, list name)` pairs of a folder, in tracker order.
    async fn folder_lists(&self, folder_id: &str) -> AppResult<Vec<(String, String)>>;
    async fn list_tasks(&self, list_id: &str) -> AppResult<Vec<TaskEntry>>;
}
