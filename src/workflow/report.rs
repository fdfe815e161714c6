use tracing::{debug, info};

use crate::domain::report::{ListReport, render_checklist};
use crate::error::AppResult;
use crate::services::TaskDirectory;

/// Markdown checklist of every test task stored under a ClickUp folder.
pub async fn folder_report(directory: &dyn TaskDirectory, folder_id: &str) -> AppResult<String> {
    let lists = directory.folder_lists(folder_id).await?;
    info!(folder = %folder_id, lists = lists.len(), "building test case report");

    let mut reports = Vec::with_capacity(lists.len());
    for (list_id, name) in lists {
        let tasks = directory.list_tasks(&list_id).await?;
        debug!(list = %list_id, tasks = tasks.len(), "fetched list tasks");
        reports.push(ListReport { name, tasks });
    }

    Ok(render_checklist(
        &format!("Test cases for folder {folder_id}"),
        &reports,
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::report::TaskEntry;
    use crate::workflow::testing::FakeTracker;

    fn task(id: &str, name: &str, parent: Option<&str>) -> TaskEntry {
        TaskEntry {
            id: id.to_string(),
            name: name.to_string(),
            parent: parent.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn renders_every_list_of_the_folder() {
        let mut tracker = FakeTracker::default();
        tracker.lists.insert(
            "F1".to_string(),
            vec![
                ("L1".to_string(), "Checkout".to_string()),
                ("L2".to_string(), "Empty".to_string()),
            ],
        );
        tracker.tasks.insert(
            "L1".to_string(),
            vec![
                task("1", "TC01 | 86a | Validate that checkout completes", None),
                task("2", "Card payment", Some("1")),
            ],
        );
        let tracker = Arc::new(tracker);

        let report = folder_report(tracker.as_ref(), "F1").await.unwrap();
        assert_eq!(
            report,
            "# Test cases for folder F1\n\
             \n## Checkout\n\
             - [ ] **TC01 | 86a | Validate that checkout completes**\n\
             \x20 - [ ] Card payment\n\
             \n## Empty\n"
        );
    }

    #[tokio::test]
    async fn unknown_folder_is_an_error() {
        let tracker = FakeTracker::default();
        assert!(folder_report(&tracker, "nope").await.is_err());
    }
}
